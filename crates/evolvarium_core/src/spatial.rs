//! Spatial grid for O(1) cell lookup and proximity queries.
//!
//! A uniform grid over the world rectangle using the offset-array pattern
//! (compressed sparse rows): `cell_offsets[i]..cell_offsets[i+1]` spans the
//! ids of every entity in cell `i`. The grid is rebuilt from truncated
//! positions once per tick by the world; between rebuilds it is read-only.
//! Cells also carry collaborator-registered plant markers and a biome tag.

use evolvarium_data::Biome;

/// A collaborator-registered plant position. The core only does
/// cell-membership bookkeeping for these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantMarker {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone)]
pub struct SpatialGrid {
    width: f64,
    height: f64,
    cols: usize,
    rows: usize,
    cell_w: f64,
    cell_h: f64,
    cell_offsets: Vec<usize>,
    entity_ids: Vec<u64>,
    plant_cells: Vec<Vec<u64>>,
    biomes: Vec<Biome>,
}

impl SpatialGrid {
    /// Creates an empty grid covering a `width` x `height` world with
    /// `cols` x `rows` cells. Dimension validation happens at world
    /// construction; this constructor assumes non-degenerate input.
    #[must_use]
    pub fn new(width: f64, height: f64, cols: usize, rows: usize) -> Self {
        debug_assert!(cols > 0 && rows > 0);
        debug_assert!(width > 0.0 && height > 0.0);
        Self {
            width,
            height,
            cols,
            rows,
            cell_w: width / cols as f64,
            cell_h: height / rows as f64,
            cell_offsets: vec![0; cols * rows + 1],
            entity_ids: Vec::new(),
            plant_cells: vec![Vec::new(); cols * rows],
            biomes: vec![Biome::default(); cols * rows],
        }
    }

    #[must_use]
    pub const fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Flat cell index for a world coordinate, or `None` for non-finite or
    /// out-of-bounds positions. Guards the cast against i32 overflow the
    /// same way positions far outside the world are rejected.
    #[inline]
    #[must_use]
    pub fn cell_idx(&self, x: f64, y: f64) -> Option<usize> {
        if !x.is_finite() || !y.is_finite() {
            return None;
        }
        if x.abs() > i32::MAX as f64 * self.cell_w || y.abs() > i32::MAX as f64 * self.cell_h {
            return None;
        }
        let cx = (x / self.cell_w) as i32;
        let cy = (y / self.cell_h) as i32;
        if x < 0.0 || y < 0.0 || cx >= self.cols as i32 || cy >= self.rows as i32 {
            None
        } else {
            Some(cy as usize * self.cols + cx as usize)
        }
    }

    /// Rebuilds entity cell membership from `(id, x, y)` triples via a
    /// counting sort into the offset array.
    pub fn rebuild(&mut self, positions: &[(u64, f64, f64)]) {
        let cell_count = self.cols * self.rows;
        let mut counts = vec![0usize; cell_count];
        for &(_, x, y) in positions {
            if let Some(idx) = self.cell_idx(x, y) {
                counts[idx] += 1;
            }
        }

        self.cell_offsets.resize(cell_count + 1, 0);
        let mut total = 0;
        for (i, &count) in counts.iter().enumerate() {
            self.cell_offsets[i] = total;
            total += count;
        }
        self.cell_offsets[cell_count] = total;

        self.entity_ids.resize(total, 0);
        let mut cursors = self.cell_offsets[..cell_count].to_vec();
        for &(id, x, y) in positions {
            if let Some(idx) = self.cell_idx(x, y) {
                self.entity_ids[cursors[idx]] = id;
                cursors[idx] += 1;
            }
        }
    }

    /// Rebuilds plant cell membership from registered markers.
    pub fn rebuild_plants(&mut self, plants: &[PlantMarker]) {
        for cell in &mut self.plant_cells {
            cell.clear();
        }
        for plant in plants {
            if let Some(idx) = self.cell_idx(plant.x, plant.y) {
                self.plant_cells[idx].push(plant.id);
            }
        }
    }

    /// Plant ids registered in the cell containing `(x, y)`.
    #[must_use]
    pub fn plants_at(&self, x: f64, y: f64) -> &[u64] {
        self.cell_idx(x, y)
            .map_or(&[][..], |idx| &self.plant_cells[idx])
    }

    /// Biome of the cell containing `(x, y)`; out-of-bounds positions read
    /// as the default biome.
    #[must_use]
    pub fn biome_at(&self, x: f64, y: f64) -> Biome {
        self.cell_idx(x, y)
            .map_or_else(Biome::default, |idx| self.biomes[idx])
    }

    /// Tags a cell with a biome; collaborator-facing terrain hook.
    pub fn set_biome(&mut self, col: usize, row: usize, biome: Biome) {
        if col < self.cols && row < self.rows {
            self.biomes[row * self.cols + col] = biome;
        }
    }

    /// Collects the ids of entities in every cell overlapping the square
    /// of half-width `radius` around `(x, y)`. Cell granularity: callers
    /// still distance-filter the candidates.
    pub fn query_into(&self, x: f64, y: f64, radius: f64, result: &mut Vec<u64>) {
        result.clear();
        self.query_callback(x, y, radius, |id| result.push(id));
    }

    pub fn query_callback<F: FnMut(u64)>(&self, x: f64, y: f64, radius: f64, mut callback: F) {
        let min_cx = ((x - radius) / self.cell_w).floor() as i64;
        let max_cx = ((x + radius) / self.cell_w).floor() as i64;
        let min_cy = ((y - radius) / self.cell_h).floor() as i64;
        let max_cy = ((y + radius) / self.cell_h).floor() as i64;

        for cy in min_cy..=max_cy {
            if cy < 0 || cy >= self.rows as i64 {
                continue;
            }
            for cx in min_cx..=max_cx {
                if cx < 0 || cx >= self.cols as i64 {
                    continue;
                }
                let cell_idx = cy as usize * self.cols + cx as usize;
                let start = self.cell_offsets[cell_idx];
                let end = self.cell_offsets[cell_idx + 1];
                for &id in &self.entity_ids[start..end] {
                    callback(id);
                }
            }
        }
    }

    /// Number of entities in cells overlapping the query square.
    #[must_use]
    pub fn count_nearby(&self, x: f64, y: f64, radius: f64) -> usize {
        let mut count = 0;
        self.query_callback(x, y, radius, |_| count += 1);
        count
    }

    #[must_use]
    pub const fn world_width(&self) -> f64 {
        self.width
    }

    #[must_use]
    pub const fn world_height(&self) -> f64 {
        self.height
    }
}
