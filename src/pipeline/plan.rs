/// Classification of the transform a resize plan calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeAction {
    /// Target edge is larger than the source's longest edge
    Upscale,
    /// Target edge is smaller than the source's longest edge
    Downscale,
    /// Longest edge already matches the target; output is a byte copy
    Identity,
}

/// Target dimensions for a proportional longest-edge resize.
///
/// Invariant: unless the action is `Identity`, the longest target side equals
/// the requested edge and the aspect ratio matches the source within the
/// rounding tolerance of one pixel per side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub original_width: u32,
    pub original_height: u32,
    pub target_width: u32,
    pub target_height: u32,
    pub action: ResizeAction,
}

/// Compute the target dimensions for fitting `width`x`height` so that its
/// longest edge equals `target_edge`.
///
/// Square images route through the width branch, so `target_width` carries
/// the edge. Callers validate `target_edge > 0` before reaching this point.
pub fn compute(width: u32, height: u32, target_edge: u32) -> ResizePlan {
    let long = width.max(height);

    if long == target_edge {
        return ResizePlan {
            original_width: width,
            original_height: height,
            target_width: width,
            target_height: height,
            action: ResizeAction::Identity,
        };
    }

    let ratio = target_edge as f64 / long as f64;
    let (target_width, target_height) = if width >= height {
        (target_edge, scale_side(height, ratio))
    } else {
        (scale_side(width, ratio), target_edge)
    };

    let action = if ratio > 1.0 {
        ResizeAction::Upscale
    } else {
        ResizeAction::Downscale
    };

    ResizePlan {
        original_width: width,
        original_height: height,
        target_width,
        target_height,
        action,
    }
}

/// Round to nearest with a 1px floor so extreme aspect ratios never produce
/// a zero-dimension output.
fn scale_side(side: u32, ratio: f64) -> u32 {
    ((side as f64 * ratio).round() as u32).max(1)
}
