use std::path::Path;

use glam::UVec2;
use image::RgbaImage;

use crate::renderer::{RenderError, Result, Rgba};

/// Edge length of one skyline cell in pixels.
pub const ATLAS_GRID: u32 = 32;
/// Cells per atlas side.
pub const ATLAS_CELLS: u32 = 64;
pub const ATLAS_SIZE: u32 = ATLAS_GRID * ATLAS_CELLS;
/// Replicated edge pixels around every texture, so bilinear and mip
/// sampling never bleeds into a neighbour.
pub const ATLAS_BORDER: u32 = 16;

/// Where a texture's content lives inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    /// Top-left of the content, excluding the border.
    pub offset: UVec2,
    pub size: UVec2,
}

impl Placement {
    /// Top-left of the padded block.
    pub fn padded_origin(&self) -> UVec2 {
        self.offset - UVec2::splat(ATLAS_BORDER)
    }

    pub fn padded_size(&self) -> UVec2 {
        self.size + UVec2::splat(ATLAS_BORDER * 2)
    }

    /// Grid column, grid width and top edge (in cells) covered by this placement.
    fn grid_span(&self) -> (u32, u32, u32) {
        let origin = self.padded_origin() / ATLAS_GRID;
        let cells = grid_cells(self.size);
        (origin.x, cells.x, origin.y + cells.y)
    }
}

/// A rectangle of atlas pixels that has to reach the GPU texture.
#[derive(Debug, Clone, PartialEq)]
pub struct AtlasUpload {
    pub origin: UVec2,
    pub size: UVec2,
    pub pixels: Vec<Rgba>,
}

fn grid_cells(size: UVec2) -> UVec2 {
    (size + UVec2::splat(ATLAS_BORDER * 2) + UVec2::splat(ATLAS_GRID - 1)) / ATLAS_GRID
}

/// Per-column height watermark of the allocated region, in cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skyline {
    heights: [u32; ATLAS_CELLS as usize],
}

impl Default for Skyline {
    fn default() -> Self {
        Self {
            heights: [0; ATLAS_CELLS as usize],
        }
    }
}

impl Skyline {
    pub fn heights(&self) -> &[u32] {
        &self.heights
    }

    /// Lowest spot for a `grid_w` x `grid_h` block, leftmost on ties.
    pub fn find(&self, grid_w: u32, grid_h: u32) -> Option<UVec2> {
        if grid_w == 0 || grid_w > ATLAS_CELLS || grid_h > ATLAS_CELLS {
            return None;
        }

        let width = grid_w as usize;
        // Candidate heights must stay strictly below this.
        let mut budget = ATLAS_CELLS - grid_h + 1;
        let mut best = None;
        let mut x = 0;
        while x + width <= self.heights.len() {
            let span = &self.heights[x..x + width];
            match span.iter().rposition(|&h| h >= budget) {
                Some(blocked) => x += blocked + 1,
                None => {
                    let height = span.iter().copied().max().unwrap_or(0);
                    best = Some(UVec2::new(x as u32, height));
                    budget = height;
                    x += 1;
                }
            }
        }
        best
    }

    /// Raise columns `x..x + w` to at least `top`.
    pub fn raise(&mut self, x: u32, w: u32, top: u32) {
        let start = x as usize;
        let end = (start + w as usize).min(self.heights.len());
        for h in &mut self.heights[start..end] {
            *h = (*h).max(top);
        }
    }

    pub fn clear(&mut self) {
        self.heights = [0; ATLAS_CELLS as usize];
    }
}

/// Skyline packer over the shared texture atlas with a CPU copy of its pixels.
pub struct AtlasAllocator {
    skyline: Skyline,
    mirror: RgbaImage,
    use_mipmaps: bool,
    mipmaps_dirty: bool,
}

impl AtlasAllocator {
    pub fn new(use_mipmaps: bool) -> Self {
        log::info!(
            "Creating {}x{} texture atlas (mipmaps: {})",
            ATLAS_SIZE,
            ATLAS_SIZE,
            use_mipmaps
        );
        Self {
            skyline: Skyline::default(),
            mirror: RgbaImage::new(ATLAS_SIZE, ATLAS_SIZE),
            use_mipmaps,
            mipmaps_dirty: false,
        }
    }

    pub fn skyline(&self) -> &Skyline {
        &self.skyline
    }

    pub fn mirror(&self) -> &RgbaImage {
        &self.mirror
    }

    pub fn use_mipmaps(&self) -> bool {
        self.use_mipmaps
    }

    /// Returns whether mipmaps need regenerating and clears the flag.
    pub fn take_mipmaps_dirty(&mut self) -> bool {
        std::mem::take(&mut self.mipmaps_dirty)
    }

    pub fn mipmaps_dirty(&self) -> bool {
        self.mipmaps_dirty
    }

    /// Reserves space for a `width` x `height` texture and writes its padded
    /// pixels. Zero-sized textures still occupy one cell but upload nothing.
    pub fn allocate(
        &mut self,
        width: u32,
        height: u32,
        pixels: &[Rgba],
    ) -> Result<(Placement, Option<AtlasUpload>)> {
        let size = UVec2::new(width, height);
        check_pixel_count(size, pixels)?;

        // Larger sizes can't fit and would overflow the padding math.
        if width > ATLAS_SIZE || height > ATLAS_SIZE {
            return Err(RenderError::AtlasFull { width, height });
        }

        let cells = grid_cells(size);
        let cell = self
            .skyline
            .find(cells.x, cells.y)
            .ok_or(RenderError::AtlasFull { width, height })?;

        self.skyline.raise(cell.x, cells.x, cell.y + cells.y);

        let placement = Placement {
            offset: cell * ATLAS_GRID + UVec2::splat(ATLAS_BORDER),
            size,
        };
        log::debug!(
            "Placed {}x{} texture at {:?} (cell {:?})",
            width,
            height,
            placement.offset,
            cell
        );

        if width == 0 || height == 0 {
            return Ok((placement, None));
        }
        Ok((placement, Some(self.write(&placement, pixels))))
    }

    /// Overwrites the content of an existing placement, border included.
    pub fn repaint(
        &mut self,
        placement: &Placement,
        pixels: &[Rgba],
    ) -> Result<Option<AtlasUpload>> {
        check_pixel_count(placement.size, pixels)?;
        if placement.size.x == 0 || placement.size.y == 0 {
            return Ok(None);
        }
        Ok(Some(self.write(placement, pixels)))
    }

    /// Forget every allocation.
    pub fn clear(&mut self) {
        self.skyline.clear();
    }

    /// Rebuild the skyline from the placements that survive a partial reset.
    pub fn rebuild(&mut self, placements: &[Placement]) {
        self.skyline.clear();
        for placement in placements {
            let (x, w, top) = placement.grid_span();
            self.skyline.raise(x, w, top);
        }
    }

    /// Write the atlas as seen by the GPU to a PNG file.
    pub fn dump<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.mirror.save(path)?;
        log::info!("Dumped texture atlas to {:?}", path);
        Ok(())
    }

    fn write(&mut self, placement: &Placement, pixels: &[Rgba]) -> AtlasUpload {
        let origin = placement.padded_origin();
        let size = placement.padded_size();
        let padded = pad_with_border(placement.size, pixels);

        for (i, px) in padded.iter().enumerate() {
            let x = origin.x + i as u32 % size.x;
            let y = origin.y + i as u32 / size.x;
            self.mirror.put_pixel(x, y, image::Rgba(px.to_array()));
        }

        if self.use_mipmaps {
            self.mipmaps_dirty = true;
        }

        AtlasUpload {
            origin,
            size,
            pixels: padded,
        }
    }
}

fn check_pixel_count(size: UVec2, pixels: &[Rgba]) -> Result<()> {
    let expected = size.x as usize * size.y as usize;
    if pixels.len() != expected {
        return Err(RenderError::PixelCount {
            expected,
            actual: pixels.len(),
        });
    }
    Ok(())
}

/// Surround `pixels` with `ATLAS_BORDER` copies of the nearest edge pixel.
pub fn pad_with_border(size: UVec2, pixels: &[Rgba]) -> Vec<Rgba> {
    if size.x == 0 || size.y == 0 {
        return Vec::new();
    }
    let padded = size + UVec2::splat(ATLAS_BORDER * 2);
    let mut out = Vec::with_capacity(padded.x as usize * padded.y as usize);
    for y in 0..padded.y {
        let sy = y.saturating_sub(ATLAS_BORDER).min(size.y - 1);
        let row = (sy * size.x) as usize;
        for x in 0..padded.x {
            let sx = x.saturating_sub(ATLAS_BORDER).min(size.x - 1);
            out.push(pixels[row + sx as usize]);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_cells_include_border() {
        assert_eq!(grid_cells(UVec2::new(0, 0)), UVec2::new(1, 1));
        assert_eq!(grid_cells(UVec2::new(1, 32)), UVec2::new(2, 2));
        assert_eq!(grid_cells(UVec2::new(64, 65)), UVec2::new(3, 4));
    }

    #[test]
    fn skyline_prefers_lowest_then_leftmost() {
        let mut skyline = Skyline::default();
        skyline.raise(0, 2, 5);
        skyline.raise(4, ATLAS_CELLS - 4, 1);
        // Columns 2..4 are at 0, the lowest span of width 2.
        assert_eq!(skyline.find(2, 1), Some(UVec2::new(2, 0)));
        // Width 3 must straddle a raised column; the lowest is at height 1.
        assert_eq!(skyline.find(3, 1), Some(UVec2::new(2, 1)));
    }

    #[test]
    fn skyline_considers_rightmost_column() {
        let mut skyline = Skyline::default();
        skyline.raise(0, ATLAS_CELLS - 1, 10);
        assert_eq!(skyline.find(1, 1), Some(UVec2::new(ATLAS_CELLS - 1, 0)));
    }

    #[test]
    fn skyline_rejects_blocks_that_overflow_the_top() {
        let mut skyline = Skyline::default();
        skyline.raise(0, ATLAS_CELLS, ATLAS_CELLS - 1);
        assert_eq!(skyline.find(1, 1), Some(UVec2::new(0, ATLAS_CELLS - 1)));
        assert_eq!(skyline.find(1, 2), None);
        assert_eq!(skyline.find(ATLAS_CELLS + 1, 1), None);
    }

    #[test]
    fn border_replicates_corners_and_edges() {
        let pixels = [
            Rgba::new(1, 0, 0, 255),
            Rgba::new(2, 0, 0, 255),
            Rgba::new(3, 0, 0, 255),
            Rgba::new(4, 0, 0, 255),
        ];
        let padded = pad_with_border(UVec2::new(2, 2), &pixels);
        let w = (2 + ATLAS_BORDER * 2) as usize;
        let at = |x: usize, y: usize| padded[y * w + x];
        assert_eq!(at(0, 0), pixels[0]);
        assert_eq!(at(w - 1, 0), pixels[1]);
        assert_eq!(at(0, w - 1), pixels[2]);
        assert_eq!(at(w - 1, w - 1), pixels[3]);
        let b = ATLAS_BORDER as usize;
        assert_eq!(at(b + 1, 0), pixels[1]);
        assert_eq!(at(b, b + 1), pixels[2]);
    }

    #[test]
    fn allocation_failure_leaves_skyline_untouched() {
        let mut atlas = AtlasAllocator::new(true);
        let before = atlas.skyline().clone();
        let err = atlas.allocate(ATLAS_SIZE, 1, &vec![Rgba::NEUTRAL; ATLAS_SIZE as usize]);
        assert!(matches!(err, Err(RenderError::AtlasFull { .. })));
        assert_eq!(atlas.skyline(), &before);
        assert!(!atlas.mipmaps_dirty());
    }

    #[test]
    fn mipmap_flag_only_raised_when_enabled() {
        let mut atlas = AtlasAllocator::new(false);
        atlas.allocate(1, 1, &[Rgba::NEUTRAL]).unwrap();
        assert!(!atlas.take_mipmaps_dirty());

        let mut atlas = AtlasAllocator::new(true);
        atlas.allocate(1, 1, &[Rgba::NEUTRAL]).unwrap();
        assert!(atlas.take_mipmaps_dirty());
        assert!(!atlas.take_mipmaps_dirty());
    }

    #[test]
    fn zero_sized_texture_reserves_a_cell_without_upload() {
        let mut atlas = AtlasAllocator::new(true);
        let (placement, upload) = atlas.allocate(0, 0, &[]).unwrap();
        assert!(upload.is_none());
        assert_eq!(placement.offset, UVec2::splat(ATLAS_BORDER));
        assert_eq!(atlas.skyline().heights()[0], 1);
    }

    #[test]
    fn rebuild_matches_incremental_allocation() {
        let mut atlas = AtlasAllocator::new(false);
        let mut placements = Vec::new();
        for (w, h) in [(100, 20), (10, 200), (64, 64), (1, 1)] {
            let pixels = vec![Rgba::NEUTRAL; w * h];
            let (p, _) = atlas.allocate(w as u32, h as u32, &pixels).unwrap();
            placements.push(p);
        }
        let incremental = atlas.skyline().clone();
        atlas.rebuild(&placements);
        assert_eq!(atlas.skyline(), &incremental);
    }
}
