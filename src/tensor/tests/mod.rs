mod norm;
mod others;
