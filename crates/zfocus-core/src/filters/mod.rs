pub mod gaussian_blur;
pub mod kernel3x3;
