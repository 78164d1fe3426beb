/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Largest transform length the Hartley tables are built for (2^30).
pub const MAX_HARTLEY_LENGTH: usize = 0x4000_0000;

/// Smallest transform length the radix-4 first stage can handle.
pub const MIN_HARTLEY_LENGTH: usize = 4;

/// Golden section ratio used by Brent's method: (3 - sqrt(5)) / 2.
pub const GOLDEN_SECTION: f64 = 0.381_966_011_250_105_1;

/// Relative tolerance for Brent's method. Stage positions behave like
/// fixed-point values, so only the absolute tolerance matters in practice;
/// 1e-9 is 1 nm at 1 m of travel.
pub const BRENT_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Default evaluation budget for Brent's method.
pub const DEFAULT_BRENT_MAX_EVALUATIONS: usize = 100;

/// Default Brent search range (um), centered on the current z.
pub const DEFAULT_SEARCH_RANGE: f64 = 10.0;

/// Default absolute Brent tolerance (um).
pub const DEFAULT_TOLERANCE: f64 = 1.0;

/// Default coarse grid step (um) and half-count.
pub const DEFAULT_COARSE_STEP: f64 = 1.0;
pub const DEFAULT_COARSE_STEPS: usize = 5;

/// Default fine grid step (um) and half-count.
pub const DEFAULT_FINE_STEP: f64 = 0.3;
pub const DEFAULT_FINE_STEPS: usize = 5;

/// Default fraction below the best score that ends a grid scan early.
pub const DEFAULT_GRID_THRESHOLD: f64 = 0.1;

/// Score a grid scan starts from before any candidate has been evaluated.
pub const GRID_SENTINEL_SCORE: f64 = 0.0;

/// Crop factor bounds.
pub const MIN_CROP_FACTOR: f64 = 0.01;
pub const MAX_CROP_FACTOR: f64 = 1.0;

/// Default FFT band-pass cutoffs, as percent of the spectrum radius.
pub const DEFAULT_FFT_LOWER_CUTOFF: f64 = 2.5;
pub const DEFAULT_FFT_UPPER_CUTOFF: f64 = 14.0;

/// Default wait for the z stage to report settled.
pub const DEFAULT_SETTLE_TIMEOUT_MS: u64 = 10_000;

/// Default wait for the camera to become ready.
pub const DEFAULT_CAMERA_TIMEOUT_MS: u64 = 10_000;

/// Sharpen kernel of the 3x3 filter family (normalized by its sum, 4).
pub const SHARPEN_KERNEL: [i32; 9] = [-1, -1, -1, -1, 12, -1, -1, -1, -1];

/// Tenengrad Sobel kernels (horizontal and vertical).
pub const TENENGRAD_KERNEL_X: [i32; 9] = [-1, 0, 1, -2, 0, 2, -1, 0, 1];
pub const TENENGRAD_KERNEL_Y: [i32; 9] = [1, 2, 1, 0, 0, 0, -1, -2, -1];

/// Diagonal Sobel kernels used by the median-edges metric.
pub const DIAGONAL_KERNEL_A: [i32; 9] = [2, 1, 0, 1, 0, -1, 0, -1, -2];
pub const DIAGONAL_KERNEL_B: [i32; 9] = [0, 1, 2, -1, 0, 1, -2, -1, 0];
