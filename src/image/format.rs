//! The on-disk image container.
//!
//! A text header followed by raw little-endian voxel data:
//!
//! ```text
//! voxcalc image
//! dim: 4,4,2
//! vox: 1,1,2.5
//! datatype: Float32
//! END
//! <binary payload, axis 0 fastest>
//! ```
//!
//! Unknown header keys are ignored on read. The payload length must match
//! `dim` and `datatype` exactly. All multi-byte values are little-endian.

use crate::core::error::{CalcError, CalcResult};
use crate::core::types::{DataType, Real, Scalar};
use crate::image::header::ImageHeader;
use crate::image::volume::VoxelImage;
use std::fs;
use std::io::{Error as IoError, ErrorKind};
use std::path::Path;

/// Magic first line identifying the container.
pub const MAGIC: &str = "voxcalc image";

/// Open an image file, widening its payload to [`Scalar`] values.
pub fn open(path: &str) -> CalcResult<VoxelImage> {
    let bytes = fs::read(path).map_err(|e| CalcError::io(path, e))?;
    let (header, data_offset) = parse_header(path, &bytes)?;

    let expected = header.voxel_count() * header.datatype.bytes_per_voxel();
    let payload = &bytes[data_offset..];
    if payload.len() < expected {
        return Err(CalcError::format(
            path,
            format!(
                "payload holds {} bytes, header requires {}",
                payload.len(),
                expected
            ),
        ));
    }
    let data = decode(header.datatype, &payload[..expected]);
    VoxelImage::from_parts(path, header, data)
}

/// Write an image file.
///
/// Refuses to overwrite an existing path unless `force` is set. On a
/// failed write the partial output is removed.
pub fn save(path: &str, header: &ImageHeader, data: &[Scalar], force: bool) -> CalcResult<()> {
    if Path::new(path).exists() && !force {
        return Err(CalcError::io(
            path,
            IoError::new(
                ErrorKind::AlreadyExists,
                "output file exists (use -force to overwrite)",
            ),
        ));
    }

    let mut out = render_header(header).into_bytes();
    out.extend_from_slice(&encode(header.datatype, data));

    fs::write(path, out).map_err(|e| {
        let _ = fs::remove_file(path);
        CalcError::io(path, e)
    })
}

fn render_header(header: &ImageHeader) -> String {
    let dim = header
        .sizes
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",");
    let vox = header
        .spacing
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!(
        "{}\ndim: {}\nvox: {}\ndatatype: {}\nEND\n",
        MAGIC, dim, vox, header.datatype
    )
}

fn parse_header(path: &str, bytes: &[u8]) -> CalcResult<(ImageHeader, usize)> {
    let mut pos = 0;
    let mut line_no = 0;
    let mut sizes: Option<Vec<usize>> = None;
    let mut spacing: Option<Vec<Real>> = None;
    let mut datatype: Option<DataType> = None;

    loop {
        let rest = &bytes[pos..];
        let end = rest
            .iter()
            .position(|&b| b == b'\n')
            .ok_or_else(|| CalcError::format(path, "unterminated header"))?;
        let line = std::str::from_utf8(&rest[..end])
            .map_err(|_| CalcError::format(path, "header is not valid UTF-8"))?
            .trim_end_matches('\r');
        pos += end + 1;

        if line_no == 0 {
            if line != MAGIC {
                return Err(CalcError::format(path, "unrecognised image format"));
            }
            line_no += 1;
            continue;
        }
        if line == "END" {
            break;
        }
        line_no += 1;

        let Some((key, value)) = line.split_once(':') else {
            return Err(CalcError::format(path, format!("malformed header line \"{line}\"")));
        };
        let value = value.trim();
        match key.trim() {
            "dim" => {
                let parsed: Result<Vec<usize>, _> =
                    value.split(',').map(|s| s.trim().parse()).collect();
                sizes = Some(parsed.map_err(|_| {
                    CalcError::format(path, format!("invalid dim entry \"{value}\""))
                })?);
            }
            "vox" => {
                let parsed: Result<Vec<Real>, _> =
                    value.split(',').map(|s| s.trim().parse()).collect();
                spacing = Some(parsed.map_err(|_| {
                    CalcError::format(path, format!("invalid vox entry \"{value}\""))
                })?);
            }
            "datatype" => {
                datatype = Some(DataType::from_spec(value).ok_or_else(|| {
                    CalcError::format(path, format!("unknown datatype \"{value}\""))
                })?);
            }
            // Unknown keys are tolerated so the format can grow.
            _ => {}
        }
    }

    let sizes = sizes.ok_or_else(|| CalcError::format(path, "missing dim entry"))?;
    let datatype = datatype.ok_or_else(|| CalcError::format(path, "missing datatype entry"))?;
    let mut header = ImageHeader::new(sizes, datatype)
        .map_err(|_| CalcError::format(path, "axis sizes must be at least 1"))?;
    match spacing {
        Some(vox) => {
            // Pad or truncate to the axis count; undeclared axes get NaN.
            header.spacing = (0..header.ndim())
                .map(|a| vox.get(a).copied().unwrap_or(Real::NAN))
                .collect();
        }
        None => header.spacing = vec![Real::NAN; header.ndim()],
    }
    Ok((header, pos))
}

fn decode(datatype: DataType, payload: &[u8]) -> Vec<Scalar> {
    let step = datatype.bytes_per_voxel();
    payload
        .chunks_exact(step)
        .map(|c| match datatype {
            DataType::Float32 => Scalar::new(f32::from_le_bytes([c[0], c[1], c[2], c[3]]), 0.0),
            DataType::Float64 => Scalar::new(
                f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32,
                0.0,
            ),
            DataType::CFloat32 => Scalar::new(
                f32::from_le_bytes([c[0], c[1], c[2], c[3]]),
                f32::from_le_bytes([c[4], c[5], c[6], c[7]]),
            ),
            DataType::CFloat64 => Scalar::new(
                f64::from_le_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]]) as f32,
                f64::from_le_bytes([c[8], c[9], c[10], c[11], c[12], c[13], c[14], c[15]]) as f32,
            ),
            DataType::Int8 => Scalar::new(c[0] as i8 as f32, 0.0),
            DataType::UInt8 => Scalar::new(c[0] as f32, 0.0),
            DataType::Int16 => Scalar::new(i16::from_le_bytes([c[0], c[1]]) as f32, 0.0),
            DataType::UInt16 => Scalar::new(u16::from_le_bytes([c[0], c[1]]) as f32, 0.0),
            DataType::Int32 => {
                Scalar::new(i32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32, 0.0)
            }
            DataType::UInt32 => {
                Scalar::new(u32::from_le_bytes([c[0], c[1], c[2], c[3]]) as f32, 0.0)
            }
        })
        .collect()
}

fn encode(datatype: DataType, data: &[Scalar]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() * datatype.bytes_per_voxel());
    for v in data {
        match datatype {
            DataType::Float32 => out.extend_from_slice(&v.re.to_le_bytes()),
            DataType::Float64 => out.extend_from_slice(&(v.re as f64).to_le_bytes()),
            DataType::CFloat32 => {
                out.extend_from_slice(&v.re.to_le_bytes());
                out.extend_from_slice(&v.im.to_le_bytes());
            }
            DataType::CFloat64 => {
                out.extend_from_slice(&(v.re as f64).to_le_bytes());
                out.extend_from_slice(&(v.im as f64).to_le_bytes());
            }
            DataType::Int8 => out.extend_from_slice(&(v.re.round() as i8).to_le_bytes()),
            DataType::UInt8 => out.extend_from_slice(&(v.re.round() as u8).to_le_bytes()),
            DataType::Int16 => out.extend_from_slice(&(v.re.round() as i16).to_le_bytes()),
            DataType::UInt16 => out.extend_from_slice(&(v.re.round() as u16).to_le_bytes()),
            DataType::Int32 => out.extend_from_slice(&(v.re.round() as i32).to_le_bytes()),
            DataType::UInt32 => out.extend_from_slice(&(v.re.round() as u32).to_le_bytes()),
        }
    }
    out
}
