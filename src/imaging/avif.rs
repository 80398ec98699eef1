//! AVIF source decoding.
//!
//! The `image` crate's `"avif"` feature only enables the encoder (rav1e), and
//! its native decoder needs the dav1d C library. Uploads are decoded here
//! instead: `avif-parse` extracts the primary AV1 item from the container and
//! `rav1d` (a pure Rust port of dav1d) decodes it to YUV planes, which are
//! converted to RGB8 with BT.601 coefficients.

use super::backend::{BackendError, Dimensions};
use image::DynamicImage;
use std::io::Cursor;

fn parse(bytes: &[u8]) -> Result<avif_parse::AvifData, BackendError> {
    avif_parse::read_avif(&mut Cursor::new(bytes))
        .map_err(|e| BackendError::Decode(format!("failed to parse avif container: {e:?}")))
}

/// Frame size from the container metadata, without decoding any pixels.
pub(super) fn read_dimensions(bytes: &[u8]) -> Result<Dimensions, BackendError> {
    let avif = parse(bytes)?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| BackendError::Decode(format!("failed to read avif metadata: {e:?}")))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Decode the primary image of an AVIF file to RGB8.
pub(super) fn decode(bytes: &[u8]) -> Result<DynamicImage, BackendError> {
    use rav1d::include::dav1d::data::Dav1dData;
    use rav1d::include::dav1d::dav1d::Dav1dSettings;
    use rav1d::include::dav1d::picture::Dav1dPicture;
    use rav1d::src::lib::{
        dav1d_close, dav1d_data_create, dav1d_data_unref, dav1d_default_settings,
        dav1d_get_picture, dav1d_open, dav1d_picture_unref, dav1d_send_data,
    };
    use std::ptr::NonNull;

    let avif = parse(bytes)?;
    let av1: &[u8] = &avif.primary_item;

    let mut settings = std::mem::MaybeUninit::<Dav1dSettings>::uninit();
    let settings_ptr = NonNull::new(settings.as_mut_ptr())
        .ok_or_else(|| BackendError::Decode("rav1d settings unavailable".into()))?;
    unsafe { dav1d_default_settings(settings_ptr) };
    let mut settings = unsafe { settings.assume_init() };
    settings.n_threads = 1;
    settings.max_frame_delay = 1;

    let mut ctx = None;
    let rc = unsafe { dav1d_open(NonNull::new(&mut ctx), NonNull::new(&mut settings)) };
    if rc.0 != 0 {
        return Err(BackendError::Decode(format!("rav1d open failed ({})", rc.0)));
    }

    let mut data = Dav1dData::default();
    let buf = unsafe { dav1d_data_create(NonNull::new(&mut data), av1.len()) };
    if buf.is_null() {
        unsafe { dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::Decode("rav1d data_create failed".into()));
    }
    unsafe { std::ptr::copy_nonoverlapping(av1.as_ptr(), buf, av1.len()) };

    let rc = unsafe { dav1d_send_data(ctx, NonNull::new(&mut data)) };
    if rc.0 != 0 {
        unsafe {
            dav1d_data_unref(NonNull::new(&mut data));
            dav1d_close(NonNull::new(&mut ctx));
        }
        return Err(BackendError::Decode(format!("rav1d send_data failed ({})", rc.0)));
    }

    let mut pic: Dav1dPicture = unsafe { std::mem::zeroed() };
    let rc = unsafe { dav1d_get_picture(ctx, NonNull::new(&mut pic)) };
    if rc.0 != 0 {
        unsafe { dav1d_close(NonNull::new(&mut ctx)) };
        return Err(BackendError::Decode(format!("rav1d get_picture failed ({})", rc.0)));
    }

    let converted = picture_to_rgb(&pic);
    unsafe {
        dav1d_picture_unref(NonNull::new(&mut pic));
        dav1d_close(NonNull::new(&mut ctx));
    }
    let (width, height, rgb) = converted?;

    image::RgbImage::from_raw(width, height, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| BackendError::Decode("decoded avif planes have the wrong size".into()))
}

/// Convert a decoded picture to `(width, height, rgb8)`.
///
/// Must run before the picture is unreferenced: the planes borrow its buffers.
fn picture_to_rgb(
    pic: &rav1d::include::dav1d::picture::Dav1dPicture,
) -> Result<(u32, u32, Vec<u8>), BackendError> {
    use rav1d::include::dav1d::headers::{
        DAV1D_PIXEL_LAYOUT_I400, DAV1D_PIXEL_LAYOUT_I420, DAV1D_PIXEL_LAYOUT_I422,
        DAV1D_PIXEL_LAYOUT_I444,
    };

    let plane = |index: usize| {
        pic.data[index]
            .map(|p| p.as_ptr() as *const u8)
            .ok_or_else(|| BackendError::Decode(format!("avif picture has no plane {index}")))
    };

    let width = pic.p.w as u32;
    let height = pic.p.h as u32;
    let layout = pic.p.layout;
    let y_ptr = plane(0)?;

    let planes = if layout == DAV1D_PIXEL_LAYOUT_I400 {
        YuvPlanes {
            y_ptr,
            u_ptr: y_ptr,
            v_ptr: y_ptr,
            y_stride: pic.stride[0],
            uv_stride: 0,
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x: false,
            ss_y: false,
            monochrome: true,
        }
    } else {
        let (ss_x, ss_y) = match layout {
            DAV1D_PIXEL_LAYOUT_I420 => (true, true),
            DAV1D_PIXEL_LAYOUT_I422 => (true, false),
            DAV1D_PIXEL_LAYOUT_I444 => (false, false),
            other => {
                return Err(BackendError::Decode(format!(
                    "unsupported avif pixel layout: {other}"
                )));
            }
        };
        YuvPlanes {
            y_ptr,
            u_ptr: plane(1)?,
            v_ptr: plane(2)?,
            y_stride: pic.stride[0],
            uv_stride: pic.stride[1],
            width,
            height,
            bpc: pic.p.bpc as u32,
            ss_x,
            ss_y,
            monochrome: false,
        }
    };

    Ok((width, height, planes.to_rgb()))
}

/// Decoded plane pointers with their strides and chroma subsampling.
struct YuvPlanes {
    y_ptr: *const u8,
    u_ptr: *const u8,
    v_ptr: *const u8,
    y_stride: isize,
    uv_stride: isize,
    width: u32,
    height: u32,
    bpc: u32,
    ss_x: bool,
    ss_y: bool,
    monochrome: bool,
}

impl YuvPlanes {
    /// Interleaved RGB8, scaled down from `bpc` bits per sample.
    fn to_rgb(&self) -> Vec<u8> {
        let max_val = ((1u32 << self.bpc) - 1) as f32;
        let center = (1u32 << (self.bpc - 1)) as f32;
        let scale = 255.0 / max_val;

        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for row in 0..self.height {
            for col in 0..self.width {
                let luma = self.sample(self.y_ptr, self.y_stride, col, row);
                let (r, g, b) = if self.monochrome {
                    (luma, luma, luma)
                } else {
                    let cx = if self.ss_x { col / 2 } else { col };
                    let cy = if self.ss_y { row / 2 } else { row };
                    let cb = self.sample(self.u_ptr, self.uv_stride, cx, cy) - center;
                    let cr = self.sample(self.v_ptr, self.uv_stride, cx, cy) - center;
                    (
                        luma + 1.402 * cr,
                        luma - 0.344136 * cb - 0.714136 * cr,
                        luma + 1.772 * cb,
                    )
                };
                for channel in [r, g, b] {
                    rgb.push((channel * scale).clamp(0.0, 255.0) as u8);
                }
            }
        }
        rgb
    }

    /// One sample; above 8 bits per channel samples are stored as `u16`.
    fn sample(&self, ptr: *const u8, stride: isize, x: u32, y: u32) -> f32 {
        let row = y as isize * stride;
        if self.bpc <= 8 {
            (unsafe { *ptr.offset(row + x as isize) }) as f32
        } else {
            let at = unsafe { ptr.offset(row + x as isize * 2) } as *const u16;
            (unsafe { at.read_unaligned() }) as f32
        }
    }
}
