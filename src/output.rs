//! Image output.
//!
//! Rendered images leave the renderer in three ways:
//! - Real-time preview via TEV (The EXR Viewer) over TCP
//! - PNG export with sRGB gamma correction for direct viewing
//! - EXR export preserving the full linear HDR values
//!
//! All failures here are recoverable: they log a warning and return, the
//! render result itself is never lost to an output error.

use exr::prelude::*;
use image::{ImageBuffer, Rgb};
use log::{debug, info, warn};
use std::net::TcpStream;
use tev_client::{PacketCreateImage, PacketUpdateImage, TevClient};

/// Send an f32 RGB image to TEV for real-time visualization.
///
/// Establishes a TCP connection to a TEV client, creates an image with
/// RGB channels, converts the buffer from interleaved to channel-wise
/// layout and transmits it. `tev_address` may omit the port, in which
/// case TEV's default 14158 is used.
pub fn send_image_to_tev(
    image: &ImageBuffer<Rgb<f32>, Vec<f32>>,
    tev_address: &str,
    width: u32,
    height: u32,
) {
    // Add default port if not specified
    let tev_address = if tev_address.contains(':') {
        tev_address.to_string()
    } else {
        format!("{}:14158", tev_address)
    };

    debug!("Attempting to connect to TEV at {}", tev_address);

    match TcpStream::connect(&tev_address) {
        Ok(stream) => {
            // Configure TCP socket for optimal performance
            if let Err(e) = stream.set_nodelay(true) {
                debug!("Failed to set TCP_NODELAY: {}", e);
            }

            debug!("TCP connection established successfully");
            let mut client = TevClient::wrap(stream);

            // Create image in TEV
            let create_packet = PacketCreateImage {
                image_name: "photonpath_output",
                width,
                height,
                channel_names: &["R", "G", "B"],
                grab_focus: true,
            };

            match client.send(create_packet) {
                Ok(_) => debug!("Image created in TEV successfully"),
                Err(e) => {
                    warn!("Failed to create image in TEV: {}", e);
                    return;
                }
            }

            // Convert image data from interleaved (RGBRGB...) to planar
            // (RRR...GGG...BBB...) for TEV
            let pixel_count = (width * height) as usize;
            let mut rgb_data = Vec::with_capacity(pixel_count * 3);
            for channel in 0..3 {
                for pixel in image.pixels() {
                    rgb_data.push(pixel[channel]);
                }
            }

            debug!(
                "Sending {} pixels to TEV ({:.1} MB)",
                rgb_data.len() / 3,
                rgb_data.len() as f32 * 4.0 / 1_000_000.0
            );
            let start_time = std::time::Instant::now();

            // Update image with pixel data
            let update_packet = PacketUpdateImage {
                image_name: "photonpath_output",
                grab_focus: false,
                channel_names: &["R", "G", "B"],
                x: 0,
                y: 0,
                width,
                height,
                channel_offsets: &[0, (width * height) as u64, (2 * width * height) as u64],
                channel_strides: &[1, 1, 1],
                data: &rgb_data,
            };

            match client.send(update_packet) {
                Ok(_) => {
                    info!(
                        "Image data sent to TEV at {} successfully in {:.2?}",
                        tev_address,
                        start_time.elapsed()
                    );
                }
                Err(e) => warn!("Failed to send image data to TEV: {}", e),
            }
        }
        Err(e) => warn!("Failed to connect to TEV on {}: {}", tev_address, e),
    }
}

/// Save an f32 RGB image as PNG with HDR to LDR tone mapping.
///
/// Values are clamped to [0, 1], pushed through the sRGB transfer curve
/// (linear segment below 0.0031308, power curve above) and scaled to
/// 8-bit integers. I/O errors are logged, not propagated.
pub fn save_image_as_png(
    image: &ImageBuffer<Rgb<f32>, Vec<f32>>,
    output_path: &str,
    width: u32,
    height: u32,
) {
    let u8_image: ImageBuffer<Rgb<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
        let pixel = image.get_pixel(x, y);

        // sRGB standard gamma correction with linear portion for dark values
        let linear_to_gamma = |linear: f32| -> f32 {
            if linear <= 0.0 {
                0.0
            } else if linear <= 0.0031308 {
                12.92 * linear
            } else {
                1.055 * linear.powf(1.0 / 2.4) - 0.055
            }
        };

        Rgb([
            (linear_to_gamma(pixel[0].clamp(0.0, 1.0)) * 255.0) as u8,
            (linear_to_gamma(pixel[1].clamp(0.0, 1.0)) * 255.0) as u8,
            (linear_to_gamma(pixel[2].clamp(0.0, 1.0)) * 255.0) as u8,
        ])
    });

    match u8_image.save(output_path) {
        Ok(_) => info!("Image saved as {}", output_path),
        Err(e) => warn!("Failed to save image: {}", e),
    }
}

/// Save an f32 RGB image as EXR with full HDR precision.
///
/// No tone mapping or gamma correction is applied; the file holds the
/// renderer's linear radiance values at 32-bit float precision, ready
/// for TEV, grading or compositing.
pub fn save_image_as_exr(
    image: &ImageBuffer<Rgb<f32>, Vec<f32>>,
    output_path: &str,
    width: u32,
    height: u32,
) {
    let pixels = image
        .pixels()
        .map(|rgb| (rgb[0], rgb[1], rgb[2]))
        .collect::<Vec<(f32, f32, f32)>>();

    let result = write_rgb_file(output_path, width as usize, height as usize, |x, y| {
        pixels[y * (width as usize) + x]
    });

    match result {
        Ok(_) => info!("HDR image saved as EXR: {}", output_path),
        Err(e) => warn!("Failed to save EXR image: {}", e),
    }
}
