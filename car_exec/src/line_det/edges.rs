//! Edge detection primitives used by LineDet
//!
//! All operations replicate the edge pixels of the image when a kernel extends past the border.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use image::{GrayImage, Luma};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// tan(22.5 deg) scaled by 1000, boundary between horizontal and diagonal gradients.
const TAN_22_5_X1000: i64 = 414;

/// tan(67.5 deg) scaled by 1000, boundary between diagonal and vertical gradients.
const TAN_67_5_X1000: i64 = 2414;

/// Fixed binomial kernels used for sizes up to 7 when no sigma is given.
const SMALL_GAUSSIAN_KERNELS: [&[f32]; 4] = [
    &[1.0],
    &[0.25, 0.5, 0.25],
    &[0.0625, 0.25, 0.375, 0.25, 0.0625],
    &[0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125]
];

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Binary edge mask produced by [`canny`].
#[derive(Debug, Clone)]
pub struct EdgeMask {
    width: u32,
    height: u32,
    data: Vec<bool>
}

/// Sobel gradients of an image, stored row major.
struct Gradients {
    width: u32,
    height: u32,
    gx: Vec<i32>,
    gy: Vec<i32>
}

/// Classification of a pixel after non-maximum suppression.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum EdgeClass {
    None,
    Weak,
    Strong
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl EdgeMask {
    /// Returns true if the pixel is an edge. Pixels outside the mask are never edges.
    pub fn is_edge(&self, x: u32, y: u32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        self.data[(y * self.width + x) as usize]
    }

    /// Total number of edge pixels.
    pub fn num_edges(&self) -> usize {
        self.data.iter().filter(|e| **e).count()
    }

    /// Indices of the columns containing at least one edge pixel, in increasing order.
    pub fn edge_columns(&self) -> Vec<u32> {
        (0..self.width)
            .filter(|&x| (0..self.height).any(|y| self.is_edge(x, y)))
            .collect()
    }
}

impl Gradients {
    fn index(&self, x: u32, y: u32) -> usize {
        (y * self.width + x) as usize
    }

    /// L1 magnitude of the gradient, or 0 outside the image.
    fn magnitude(&self, x: i64, y: i64) -> u32 {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return 0;
        }
        let i = self.index(x as u32, y as u32);
        self.gx[i].unsigned_abs() + self.gy[i].unsigned_abs()
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Build a normalised 1D Gaussian kernel of the given (odd) size.
///
/// If `sigma` is less than or equal to zero, sizes 1 to 7 use the fixed
/// binomial tables and larger sizes derive sigma as
/// `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f32> {
    let sigma = if sigma > 0.0 {
        sigma
    }
    else {
        if size % 2 == 1 && size <= 7 {
            return SMALL_GAUSSIAN_KERNELS[size / 2].to_vec();
        }
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };

    let half = (size / 2) as i64;
    let mut kernel: Vec<f32> = (-half..=half)
        .map(|i| (-((i * i) as f64) / (2.0 * sigma * sigma)).exp() as f32)
        .collect();

    let sum: f32 = kernel.iter().sum();
    for k in kernel.iter_mut() {
        *k /= sum;
    }

    kernel
}

/// Blur an image with a separable kernel, applied along rows then columns.
pub fn gaussian_blur(src: &GrayImage, kernel: &[f32]) -> GrayImage {
    let (w, h) = src.dimensions();
    if w == 0 || h == 0 || kernel.is_empty() {
        return src.clone();
    }

    let half = (kernel.len() / 2) as i64;

    // Horizontal pass
    let mut rows = vec![0f32; (w * h) as usize];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0f32;
            for (ki, kv) in kernel.iter().enumerate() {
                let sx = clamp_index(x as i64 + ki as i64 - half, w);
                acc += src.get_pixel(sx, y).0[0] as f32 * kv;
            }
            rows[(y * w + x) as usize] = acc;
        }
    }

    // Vertical pass
    GrayImage::from_fn(w, h, |x, y| {
        let mut acc = 0f32;
        for (ki, kv) in kernel.iter().enumerate() {
            let sy = clamp_index(y as i64 + ki as i64 - half, h);
            acc += rows[(sy * w + x) as usize] * kv;
        }
        Luma([acc.round().max(0.0).min(255.0) as u8])
    })
}

/// Canny edge detection.
///
/// Gradients come from the 3x3 Sobel operator with an L1 magnitude. Pixels
/// which are not a local maximum along the (quantised) gradient direction are
/// suppressed. Remaining pixels above `high` are strong edges, those above
/// `low` are kept only if they are 8-connected to a strong edge.
pub fn canny(src: &GrayImage, low: u32, high: u32) -> EdgeMask {
    let grad = sobel(src);
    let (w, h) = (grad.width, grad.height);
    let n = (w * h) as usize;

    // ---- NON-MAXIMUM SUPPRESSION ----

    let mut class = vec![EdgeClass::None; n];
    let mut stack: Vec<(u32, u32)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let (xi, yi) = (x as i64, y as i64);
            let m = grad.magnitude(xi, yi);
            if m <= low {
                continue;
            }

            let i = grad.index(x, y);
            let ax = grad.gx[i].unsigned_abs() as i64;
            let ay = grad.gy[i].unsigned_abs() as i64;

            // Neighbours either side along the gradient direction
            let (prev, next) = if ay * 1000 <= ax * TAN_22_5_X1000 {
                (grad.magnitude(xi - 1, yi), grad.magnitude(xi + 1, yi))
            }
            else if ay * 1000 >= ax * TAN_67_5_X1000 {
                (grad.magnitude(xi, yi - 1), grad.magnitude(xi, yi + 1))
            }
            else if (grad.gx[i] > 0) == (grad.gy[i] > 0) {
                (grad.magnitude(xi - 1, yi - 1), grad.magnitude(xi + 1, yi + 1))
            }
            else {
                (grad.magnitude(xi + 1, yi - 1), grad.magnitude(xi - 1, yi + 1))
            };

            if m > prev && m >= next {
                if m > high {
                    class[i] = EdgeClass::Strong;
                    stack.push((x, y));
                }
                else {
                    class[i] = EdgeClass::Weak;
                }
            }
        }
    }

    // ---- HYSTERESIS ----

    let mut data = vec![false; n];
    for &(x, y) in stack.iter() {
        data[(y * w + x) as usize] = true;
    }

    while let Some((x, y)) = stack.pop() {
        for dy in -1i64..=1 {
            for dx in -1i64..=1 {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                    continue;
                }

                let ni = (ny as u32 * w + nx as u32) as usize;
                if class[ni] == EdgeClass::Weak && !data[ni] {
                    data[ni] = true;
                    stack.push((nx as u32, ny as u32));
                }
            }
        }
    }

    EdgeMask {
        width: w,
        height: h,
        data
    }
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

/// Compute the Sobel gradients of the image.
fn sobel(src: &GrayImage) -> Gradients {
    let (w, h) = src.dimensions();
    let n = (w * h) as usize;
    let mut gx = vec![0i32; n];
    let mut gy = vec![0i32; n];

    let px = |x: i64, y: i64| -> i32 {
        src.get_pixel(clamp_index(x, w), clamp_index(y, h)).0[0] as i32
    };

    for y in 0..h {
        for x in 0..w {
            let (x, y) = (x as i64, y as i64);
            let i = (y as u32 * w + x as u32) as usize;

            gx[i] = (px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x - 1, y) + px(x - 1, y + 1));

            gy[i] = (px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1))
                - (px(x - 1, y - 1) + 2 * px(x, y - 1) + px(x + 1, y - 1));
        }
    }

    Gradients {
        width: w,
        height: h,
        gx,
        gy
    }
}

/// Clamp a possibly out of range index into `[0, len)`.
fn clamp_index(i: i64, len: u32) -> u32 {
    i.max(0).min(len as i64 - 1) as u32
}
