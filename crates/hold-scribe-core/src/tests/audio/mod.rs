mod capture;
mod resampler;
