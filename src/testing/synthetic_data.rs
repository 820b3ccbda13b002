//! Synthetic frame content for hardware-free testing

use crate::types::CameraFrame;

/// Create a synthetic RGB24 frame whose content changes with `frame_number`
pub fn synthetic_video_frame(frame_number: u64, width: u32, height: u32) -> CameraFrame {
    let (w, h) = (width as usize, height as usize);
    let mut data = vec![0u8; w * h * 3];

    // Gradient shifted per frame so consecutive frames differ
    let base = (frame_number % 256) as u8;
    for (y, row) in data.chunks_exact_mut((w * 3).max(1)).enumerate() {
        for (x, pixel) in row.chunks_exact_mut(3).enumerate() {
            pixel[0] = base.wrapping_add(x as u8);
            pixel[1] = base.wrapping_add(y as u8);
            pixel[2] = base.wrapping_add(x.wrapping_add(y) as u8);
        }
    }

    CameraFrame::new(data, width, height, "synthetic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_video_frame_correct_size() {
        let frame = synthetic_video_frame(0, 64, 48);
        assert_eq!(frame.width, 64);
        assert_eq!(frame.height, 48);
        assert_eq!(frame.data.len(), 64 * 48 * 3);
    }

    #[test]
    fn test_wide_row_gradient() {
        let frame = synthetic_video_frame(3, 300, 1);
        assert_eq!(frame.data.len(), 900);
        assert_eq!(frame.data[3 * 299], 3u8.wrapping_add(299u32 as u8));
    }

    #[test]
    fn test_zero_sized_frame() {
        let frame = synthetic_video_frame(0, 0, 0);
        assert!(frame.data.is_empty());
    }

    #[test]
    fn test_synthetic_video_frames_differ() {
        let frame0 = synthetic_video_frame(0, 32, 24);
        let frame1 = synthetic_video_frame(1, 32, 24);
        assert_ne!(frame0.data[0], frame1.data[0]);
    }
}
