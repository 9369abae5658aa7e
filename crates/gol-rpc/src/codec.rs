//! Framing and binary encode/decode for the wire protocol.
//!
//! Every message travels as one frame: a little-endian `u32` payload
//! length followed by the payload. Payloads start with a tag byte; all
//! integers are little-endian and byte arrays are `u32` length-prefixed.
//! A world is `height u32, width u32, cells` with one byte per cell
//! (`0` dead, `255` alive).

use std::io::{Read, Write};

use gol_core::{Band, Cell, CellCoord, TurnId, World};

use crate::error::RpcError;

/// Largest accepted frame payload (256 MiB).
pub const MAX_FRAME_LEN: usize = 256 * 1024 * 1024;

// ── Framing ─────────────────────────────────────────────────────

/// Write `payload` as one length-prefixed frame and flush.
pub fn write_frame(w: &mut dyn Write, payload: &[u8]) -> Result<(), RpcError> {
    if payload.len() > MAX_FRAME_LEN {
        return Err(RpcError::FrameTooLarge {
            len: payload.len(),
            max: MAX_FRAME_LEN,
        });
    }
    write_u32_le(w, payload.len() as u32)?;
    w.write_all(payload)?;
    w.flush()?;
    Ok(())
}

/// Read one frame, returning its payload.
///
/// The length is checked before any payload buffer is allocated.
pub fn read_frame(r: &mut dyn Read) -> Result<Vec<u8>, RpcError> {
    let len = read_u32_le(r)? as usize;
    if len > MAX_FRAME_LEN {
        return Err(RpcError::FrameTooLarge {
            len,
            max: MAX_FRAME_LEN,
        });
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

// ── Primitive writers ───────────────────────────────────────────

/// Write a single byte.
pub fn write_u8(w: &mut dyn Write, v: u8) -> Result<(), RpcError> {
    w.write_all(&[v])?;
    Ok(())
}

/// Write a little-endian u32.
pub fn write_u32_le(w: &mut dyn Write, v: u32) -> Result<(), RpcError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a little-endian u64.
pub fn write_u64_le(w: &mut dyn Write, v: u64) -> Result<(), RpcError> {
    w.write_all(&v.to_le_bytes())?;
    Ok(())
}

/// Write a length-prefixed UTF-8 string (u32 length + bytes).
pub fn write_str(w: &mut dyn Write, s: &str) -> Result<(), RpcError> {
    write_bytes(w, s.as_bytes())
}

/// Write a length-prefixed byte array (u32 length + bytes).
pub fn write_bytes(w: &mut dyn Write, b: &[u8]) -> Result<(), RpcError> {
    write_u32_le(w, b.len() as u32)?;
    w.write_all(b)?;
    Ok(())
}

/// Write a `usize` as u32, rejecting values that do not fit.
pub fn write_len(w: &mut dyn Write, v: usize) -> Result<(), RpcError> {
    let v = u32::try_from(v).map_err(|_| RpcError::MalformedFrame {
        detail: format!("value {v} does not fit in u32"),
    })?;
    write_u32_le(w, v)
}

// ── Primitive readers ───────────────────────────────────────────

/// Read a single byte.
pub fn read_u8(r: &mut dyn Read) -> Result<u8, RpcError> {
    let mut buf = [0u8; 1];
    r.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Read a little-endian u32.
pub fn read_u32_le(r: &mut dyn Read) -> Result<u32, RpcError> {
    let mut buf = [0u8; 4];
    r.read_exact(&mut buf)?;
    Ok(u32::from_le_bytes(buf))
}

/// Read a little-endian u64.
pub fn read_u64_le(r: &mut dyn Read) -> Result<u64, RpcError> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf)?;
    Ok(u64::from_le_bytes(buf))
}

/// Read a length-prefixed byte array.
pub fn read_bytes(r: &mut dyn Read) -> Result<Vec<u8>, RpcError> {
    let len = read_u32_le(r)? as usize;
    if len > MAX_FRAME_LEN {
        return Err(RpcError::MalformedFrame {
            detail: format!("byte array of {len} bytes exceeds frame limit"),
        });
    }
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)?;
    Ok(buf)
}

/// Read a length-prefixed UTF-8 string.
pub fn read_str(r: &mut dyn Read) -> Result<String, RpcError> {
    String::from_utf8(read_bytes(r)?).map_err(|e| RpcError::MalformedFrame {
        detail: format!("invalid UTF-8 string: {e}"),
    })
}

fn read_usize(r: &mut dyn Read) -> Result<usize, RpcError> {
    Ok(read_u32_le(r)? as usize)
}

// ── Domain types ────────────────────────────────────────────────

/// Encode a turn number.
pub fn write_turn(w: &mut dyn Write, turn: TurnId) -> Result<(), RpcError> {
    write_u32_le(w, turn.0)
}

/// Decode a turn number.
pub fn read_turn(r: &mut dyn Read) -> Result<TurnId, RpcError> {
    Ok(TurnId(read_u32_le(r)?))
}

/// Encode a world: height, width, then the cell bytes.
pub fn write_world(w: &mut dyn Write, world: &World) -> Result<(), RpcError> {
    write_len(w, world.height())?;
    write_len(w, world.width())?;
    write_bytes(w, &world.to_bytes())
}

/// Decode a world. The cell count must equal `height * width`.
pub fn read_world(r: &mut dyn Read) -> Result<World, RpcError> {
    let height = read_usize(r)?;
    let width = read_usize(r)?;
    let bytes = read_bytes(r)?;
    Ok(World::from_bytes(height, width, &bytes)?)
}

/// Encode a band rectangle as four u32s: start_y, end_y, start_x, end_x.
pub fn write_band(w: &mut dyn Write, band: &Band) -> Result<(), RpcError> {
    write_len(w, band.start_y)?;
    write_len(w, band.end_y)?;
    write_len(w, band.start_x)?;
    write_len(w, band.end_x)
}

/// Decode a band rectangle.
pub fn read_band(r: &mut dyn Read) -> Result<Band, RpcError> {
    Ok(Band::new(
        read_usize(r)?,
        read_usize(r)?,
        read_usize(r)?,
        read_usize(r)?,
    ))
}

/// Encode raw cells as a length-prefixed byte array.
pub fn write_cells(w: &mut dyn Write, cells: &[Cell]) -> Result<(), RpcError> {
    let bytes: Vec<u8> = cells.iter().map(|c| c.as_byte()).collect();
    write_bytes(w, &bytes)
}

/// Decode raw cells.
pub fn read_cells(r: &mut dyn Read) -> Result<Vec<Cell>, RpcError> {
    Ok(read_bytes(r)?.into_iter().map(Cell::from_byte).collect())
}

/// Encode a coordinate list: u32 count, then `(x, y)` u32 pairs.
pub fn write_coords(w: &mut dyn Write, coords: &[CellCoord]) -> Result<(), RpcError> {
    write_len(w, coords.len())?;
    for c in coords {
        write_len(w, c.x)?;
        write_len(w, c.y)?;
    }
    Ok(())
}

/// Decode a coordinate list.
pub fn read_coords(r: &mut dyn Read) -> Result<Vec<CellCoord>, RpcError> {
    let count = read_usize(r)?;
    // Each coordinate is 8 bytes; bound the preallocation by the frame limit.
    let mut coords = Vec::with_capacity(count.min(MAX_FRAME_LEN / 8));
    for _ in 0..count {
        let x = read_usize(r)?;
        let y = read_usize(r)?;
        coords.push(CellCoord::new(x, y));
    }
    Ok(coords)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_world() -> World {
        let alive = [(0, 0), (2, 1), (4, 2)].map(CellCoord::from);
        World::with_alive(3, 5, alive).unwrap()
    }

    #[test]
    fn world_encoding_layout() {
        let mut buf = Vec::new();
        write_world(&mut buf, &sample_world()).unwrap();
        assert_eq!(&buf[0..4], &3u32.to_le_bytes());
        assert_eq!(&buf[4..8], &5u32.to_le_bytes());
        assert_eq!(&buf[8..12], &15u32.to_le_bytes());
        assert_eq!(buf[12], 255);
        assert_eq!(buf[13], 0);
        assert_eq!(buf.len(), 12 + 15);
    }

    #[test]
    fn world_decodes_to_same_cells() {
        let mut buf = Vec::new();
        write_world(&mut buf, &sample_world()).unwrap();
        let decoded = read_world(&mut Cursor::new(buf)).unwrap();
        assert_eq!(decoded, sample_world());
    }

    #[test]
    fn world_with_wrong_cell_count_rejected() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 3).unwrap();
        write_u32_le(&mut buf, 5).unwrap();
        write_bytes(&mut buf, &[0; 14]).unwrap();
        assert!(matches!(
            read_world(&mut Cursor::new(buf)),
            Err(RpcError::World(_))
        ));
    }

    #[test]
    fn oversized_frame_rejected_before_allocation() {
        let header = ((MAX_FRAME_LEN + 1) as u32).to_le_bytes();
        let err = read_frame(&mut Cursor::new(header.to_vec())).unwrap_err();
        assert!(matches!(err, RpcError::FrameTooLarge { .. }));
    }

    #[test]
    fn truncated_frame_is_io_error() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 10).unwrap();
        buf.extend_from_slice(&[1, 2, 3]);
        let err = read_frame(&mut Cursor::new(buf)).unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn frames_are_read_back_in_sequence() {
        let mut buf = Vec::new();
        write_frame(&mut buf, b"one").unwrap();
        write_frame(&mut buf, b"").unwrap();
        write_frame(&mut buf, b"three").unwrap();
        let mut cur = Cursor::new(buf);
        assert_eq!(read_frame(&mut cur).unwrap(), b"one");
        assert_eq!(read_frame(&mut cur).unwrap(), b"");
        assert_eq!(read_frame(&mut cur).unwrap(), b"three");
    }

    #[test]
    fn non_alive_bytes_decode_as_dead() {
        let mut buf = Vec::new();
        write_bytes(&mut buf, &[0, 1, 128, 255]).unwrap();
        let cells = read_cells(&mut Cursor::new(buf)).unwrap();
        assert_eq!(cells, vec![Cell::Dead, Cell::Dead, Cell::Dead, Cell::Alive]);
    }
}
