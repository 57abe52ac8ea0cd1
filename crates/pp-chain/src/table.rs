use pp_core::Error;
use pp_scan::ScanMinimum;

/// Parallel minimum tracks per scanned row.
pub const GROUPS: usize = 3;

/// One scanned row's minimum, stored in one of the [`GROUPS`] slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowMinimum {
    pub left: i32,
    pub right: i32,
    pub position: i32,
    pub grey: i32,
    /// First image row of the scan band.
    pub row: i32,
    pub deleted: bool,
    /// Number of linked minima up to and including this one.
    pub chain_len: u32,
    /// Group in the previous row this minimum continues.
    pub link_back: Option<usize>,
    /// Group in the next row that continues this minimum.
    pub link_forward: Option<usize>,
}

impl RowMinimum {
    fn from_scan(row: i32, m: &ScanMinimum) -> Self {
        Self {
            left: m.left,
            right: m.right,
            position: m.position,
            grey: m.grey,
            row,
            deleted: false,
            chain_len: 1,
            link_back: None,
            link_forward: None,
        }
    }

    /// Placeholder for a row without a minimum, used when a gap is bridged.
    pub fn gap(row: i32) -> Self {
        Self {
            left: 0,
            right: 0,
            position: 0,
            grey: 0,
            row,
            deleted: true,
            chain_len: 0,
            link_back: None,
            link_forward: None,
        }
    }
}

/// True when two minima plausibly belong to the same track: two of the three
/// x features (left edge, right edge, position) differ by less than
/// `max_delta`, with at least one of them being an edge.
pub fn minima_compatible(a: &RowMinimum, b: &RowMinimum, max_delta: i32) -> bool {
    let dl = (a.left - b.left).abs() < max_delta;
    let dr = (a.right - b.right).abs() < max_delta;
    let dp = (a.position - b.position).abs() < max_delta;
    (dl && dr) || (dl && dp) || (dr && dp)
}

/// Node address in the row-to-row link graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupLink {
    pub row: usize,
    pub group: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MinimaRow {
    pub image_row: i32,
    pub slots: [Option<RowMinimum>; GROUPS],
}

impl MinimaRow {
    fn survivors(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.is_some_and(|m| !m.deleted))
            .count()
    }
}

/// Per-image table of row minima with explicit group links between adjacent
/// rows. Rows are appended in scan order and indexed from 0.
#[derive(Debug, Clone)]
pub struct RowMinimaTable {
    rows: Vec<MinimaRow>,
    capacity: usize,
}

impl RowMinimaTable {
    pub fn new(capacity: usize) -> Self {
        Self {
            rows: Vec::new(),
            capacity,
        }
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[MinimaRow] {
        &self.rows
    }

    pub fn slot(&self, row: usize, group: usize) -> Option<&RowMinimum> {
        self.rows.get(row).and_then(|r| r.slots.get(group)?.as_ref())
    }

    pub(crate) fn slot_mut(&mut self, row: usize, group: usize) -> Option<&mut RowMinimum> {
        self.rows
            .get_mut(row)
            .and_then(|r| r.slots.get_mut(group)?.as_mut())
    }

    /// Group-0 minimum of `row`, whether deleted or not.
    pub fn primary(&self, row: usize) -> Option<&RowMinimum> {
        self.slot(row, 0)
    }

    /// Group-0 minimum of `row` if it is still live.
    pub fn live_primary(&self, row: usize) -> Option<&RowMinimum> {
        self.primary(row).filter(|m| !m.deleted)
    }

    pub fn image_row(&self, row: usize) -> Option<i32> {
        self.rows.get(row).map(|r| r.image_row)
    }

    /// Node this minimum continues in the previous row.
    pub fn back_link(&self, at: GroupLink) -> Option<GroupLink> {
        let g = self.slot(at.row, at.group)?.link_back?;
        Some(GroupLink {
            row: at.row.checked_sub(1)?,
            group: g,
        })
    }

    /// Node continuing this minimum in the next row.
    pub fn forward_link(&self, at: GroupLink) -> Option<GroupLink> {
        let g = self.slot(at.row, at.group)?.link_forward?;
        Some(GroupLink {
            row: at.row + 1,
            group: g,
        })
    }

    /// Appends one scanned row.
    ///
    /// Minima at least `max_width` wide are dropped and the rest packed to
    /// the lowest groups. Each minimum, from the highest group down, is then
    /// linked to the first compatible minimum of the previous row, trying its
    /// own group first, then lower groups in descending order, then higher
    /// ones. Links never cross: a group may only link below the group linked
    /// by the nearest higher linked minimum.
    pub fn push_row(
        &mut self,
        image_row: i32,
        minima: &[ScanMinimum],
        max_width: i32,
        link_delta: i32,
    ) -> Result<(), Error> {
        if self.rows.len() >= self.capacity {
            return Err(Error::CapacityExceeded {
                capacity: self.capacity,
            });
        }

        let mut slots = [None; GROUPS];
        let kept = minima.iter().filter(|m| m.right - m.left < max_width);
        for (slot, m) in slots.iter_mut().zip(kept) {
            *slot = Some(RowMinimum::from_scan(image_row, m));
        }

        if let Some(prev) = self.rows.last() {
            let mut ceiling = GROUPS;
            for c in (0..GROUPS).rev() {
                let Some(cur) = slots[c].as_mut() else {
                    continue;
                };
                let order = std::iter::once(c)
                    .chain((0..c).rev())
                    .chain(c + 1..GROUPS)
                    .filter(|&g| g < ceiling);
                for g in order {
                    let Some(p) = prev.slots[g].as_ref() else {
                        continue;
                    };
                    if minima_compatible(cur, p, link_delta) {
                        cur.chain_len = p.chain_len + 1;
                        cur.link_back = Some(g);
                        ceiling = g;
                        break;
                    }
                }
            }
        }

        self.rows.push(MinimaRow { image_row, slots });
        Ok(())
    }

    /// Deletes minima that are not part of a linked run of at least
    /// `min_len` rows.
    ///
    /// Walks rows bottom-up: a minimum survives if a later survivor links to
    /// it or its own run already reached `min_len`, and a survivor marks the
    /// minimum it continues so that the whole run is kept.
    pub fn kill_short_fragments(&mut self, min_len: u32) {
        for i in (0..self.rows.len()).rev() {
            for g in 0..GROUPS {
                let Some(m) = self.rows[i].slots[g].as_mut() else {
                    continue;
                };
                if m.deleted {
                    continue;
                }
                if m.link_forward.is_some() || m.chain_len >= min_len {
                    if m.chain_len > 1 && i > 0 {
                        if let Some(b) = m.link_back {
                            if let Some(p) = self.slot_mut(i - 1, b) {
                                p.link_forward = Some(g);
                            }
                        }
                    }
                } else {
                    m.deleted = true;
                }
            }
        }
    }

    /// Moves live minima of every row to the lowest groups, keeping their
    /// order and rewriting neighbour links. Deleted minima are dropped.
    pub fn pack(&mut self) {
        for i in 0..self.rows.len() {
            let old = self.rows[i].slots;
            let mut packed = [None; GROUPS];
            let mut remap = [None; GROUPS];
            let mut n = 0;
            for (g, s) in old.iter().enumerate() {
                if let Some(m) = s.filter(|m| !m.deleted) {
                    packed[n] = Some(m);
                    remap[g] = Some(n);
                    n += 1;
                }
            }
            self.rows[i].slots = packed;

            if i > 0 {
                for s in self.rows[i - 1].slots.iter_mut().flatten() {
                    s.link_forward = s.link_forward.and_then(|f| remap[f]);
                }
            }
            if i + 1 < self.rows.len() {
                for s in self.rows[i + 1].slots.iter_mut().flatten() {
                    s.link_back = s.link_back.and_then(|b| remap[b]);
                }
            }
        }
    }

    /// Deletes every minimum of rows where more than one minimum is still
    /// live, and detaches neighbour links that pointed at them.
    pub fn eliminate_multi_minima(&mut self) {
        for i in 0..self.rows.len() {
            if self.rows[i].survivors() < 2 {
                continue;
            }
            for g in 0..GROUPS {
                let Some(m) = self.rows[i].slots[g].as_mut() else {
                    continue;
                };
                m.deleted = true;
                let (back, fwd) = (m.link_back, m.link_forward);
                if let (Some(b), true) = (back, i > 0) {
                    if let Some(p) = self.slot_mut(i - 1, b) {
                        if p.link_forward == Some(g) {
                            p.link_forward = None;
                        }
                    }
                }
                if let Some(f) = fwd {
                    if let Some(n) = self.slot_mut(i + 1, f) {
                        if n.link_back == Some(g) {
                            n.link_back = None;
                        }
                    }
                }
            }
        }
    }

    /// Marks the group-0 minimum of `row` deleted.
    pub fn delete_primary(&mut self, row: usize) {
        if let Some(m) = self.slot_mut(row, 0) {
            m.deleted = true;
        }
    }

    /// Sets the group-0 edges of `row` to the midpoint of its neighbours,
    /// creating a deleted placeholder first if the row has no minimum.
    pub fn fill_primary_edges(&mut self, row: usize) {
        if row == 0 || row + 1 >= self.rows.len() {
            return;
        }
        let (Some(a), Some(b)) = (self.primary(row - 1), self.primary(row + 1)) else {
            return;
        };
        let (left, right) = ((a.left + b.left) / 2, (a.right + b.right) / 2);
        let image_row = self.rows[row].image_row;
        let m = self.rows[row].slots[0].get_or_insert_with(|| RowMinimum::gap(image_row));
        m.left = left;
        m.right = right;
    }
}
