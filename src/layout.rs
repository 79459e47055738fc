//! # Layout Engine
//!
//! Computes where a symbol lands on its canvas.
//!
//! ## Positions
//!
//! ```text
//! ┌──────────────────────────────┐
//! │ top-left            top-right│   corners sit MARGIN px
//! │                              │   in from both edges
//! │            middle            │
//! │                              │
//! │ bottom-left      bottom-right│
//! └──────────────────────────────┘
//! ```
//!
//! `middle` is `⌊container/2⌋ - ⌊element/2⌋ - ⌊MARGIN/2⌋` on each axis.
//!
//! Geometry is validated before any placement: every dimension must be
//! positive and the container must be strictly larger than the element on
//! both axes. The resulting offset must also keep the element fully inside
//! the container; nothing is clipped or clamped.

use serde::Serialize;

use crate::error::{BarstampError, Result};
use crate::symbol::{Position, ResolvedSymbol};

/// Spacing used for corner and edge positions.
pub const MARGIN: u32 = 10;

/// Pixel offset of an element's top-left corner within its container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub top: u32,
    pub left: u32,
}

/// Check that an element of `element_w × element_h` can be placed on a
/// container of `container_w × container_h`.
pub fn validate_geometry(
    container_w: u32,
    container_h: u32,
    element_w: u32,
    element_h: u32,
) -> Result<()> {
    if container_w == 0 || container_h == 0 || element_w == 0 || element_h == 0 {
        return Err(BarstampError::validation(format!(
            "dimensions must be positive (container {}x{}, element {}x{})",
            container_w, container_h, element_w, element_h
        )));
    }
    if container_w <= element_w || container_h <= element_h {
        return Err(BarstampError::validation(format!(
            "container {}x{} must be larger than element {}x{}",
            container_w, container_h, element_w, element_h
        )));
    }
    Ok(())
}

/// Compute the placement for a relative position.
///
/// Stricter than [`validate_geometry`] alone: an element that is smaller
/// than its container but within [`MARGIN`] of its size on an axis is
/// rejected, even at `top-left`, because the margin would push it past
/// the far edge.
pub fn place(
    position: Position,
    container_w: u32,
    container_h: u32,
    element_w: u32,
    element_h: u32,
) -> Result<Placement> {
    validate_geometry(container_w, container_h, element_w, element_h)?;

    let (cw, ch, ew, eh, m) = (
        i64::from(container_w),
        i64::from(container_h),
        i64::from(element_w),
        i64::from(element_h),
        i64::from(MARGIN),
    );
    let at_right = cw - ew - m;
    let at_bottom = ch - eh - m;

    let (top, left) = match position {
        Position::TopLeft => (m, m),
        Position::TopRight => (m, at_right),
        Position::BottomLeft => (at_bottom, m),
        Position::BottomRight => (at_bottom, at_right),
        Position::Middle => (ch / 2 - eh / 2 - m / 2, cw / 2 - ew / 2 - m / 2),
    };

    checked_placement(top, left, container_w, container_h, element_w, element_h)
}

/// Placement for a resolved symbol: its explicit location if it has one,
/// otherwise its relative position.
pub fn resolve_placement(
    symbol: &ResolvedSymbol,
    container_w: u32,
    container_h: u32,
) -> Result<Placement> {
    match symbol.location() {
        Some(location) => {
            validate_geometry(container_w, container_h, symbol.width(), symbol.height())?;
            checked_placement(
                i64::from(location.top),
                i64::from(location.left),
                container_w,
                container_h,
                symbol.width(),
                symbol.height(),
            )
        }
        None => place(
            symbol.position(),
            container_w,
            container_h,
            symbol.width(),
            symbol.height(),
        ),
    }
}

fn checked_placement(
    top: i64,
    left: i64,
    container_w: u32,
    container_h: u32,
    element_w: u32,
    element_h: u32,
) -> Result<Placement> {
    let fits = top >= 0
        && left >= 0
        && top + i64::from(element_h) <= i64::from(container_h)
        && left + i64::from(element_w) <= i64::from(container_w);
    if !fits {
        return Err(BarstampError::validation(format!(
            "element {}x{} at (top {}, left {}) falls outside container {}x{}",
            element_w, element_h, top, left, container_w, container_h
        )));
    }
    // Both offsets are bounded by u32 container dimensions here
    Ok(Placement {
        top: top as u32,
        left: left as u32,
    })
}
