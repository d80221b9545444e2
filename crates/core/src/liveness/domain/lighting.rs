use crate::shared::frame::Frame;

/// Mean colour intensity (0-255) of the frame reduced to a `raster` x
/// `raster` nearest-neighbour grid. Alpha is ignored.
///
/// Returns 0.0 for a frame with no pixels.
pub fn mean_brightness(frame: &Frame, raster: u32) -> f64 {
    if !frame.is_ready() || raster == 0 {
        return 0.0;
    }

    let src = frame.as_ndarray();
    let channels = frame.color_channels();
    let fw = frame.width() as usize;
    let fh = frame.height() as usize;
    let n = raster as usize;

    let mut sum = 0u64;
    for ry in 0..n {
        let row = ry * fh / n;
        for rx in 0..n {
            let col = rx * fw / n;
            for c in 0..channels {
                sum += src[[row, col, c]] as u64;
            }
        }
    }

    sum as f64 / (n * n * channels) as f64
}
