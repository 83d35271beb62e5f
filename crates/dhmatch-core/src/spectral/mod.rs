pub mod dct;
pub mod fft;
pub mod filters;
pub mod resample;

pub use fft::{fft2, fft2_real, fftshift, ifft2, ifft2_real, ifftshift};
pub use filters::normalize_power_spectrum;
pub use resample::{pad_spectrum, upsample_spectrum};
