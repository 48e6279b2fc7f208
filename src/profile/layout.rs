//! Physical key adjacency on a QWERTY layout

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

/// Rows of the main block, top to bottom
const QWERTY_ROWS: [&str; 4] = ["`1234567890-=", "qwertyuiop[]\\", "asdfghjkl;'", "zxcvbnm,./"];

static QWERTY: Lazy<Arc<AdjacencyMap>> = Lazy::new(|| Arc::new(AdjacencyMap::from_rows(&QWERTY_ROWS)));

/// Maps each key to the keys physically next to it
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdjacencyMap {
    neighbors: HashMap<char, Vec<char>>,
}

impl AdjacencyMap {
    /// Shared QWERTY map, built on first use
    pub fn qwerty() -> Arc<AdjacencyMap> {
        Arc::clone(&QWERTY)
    }

    /// Build a map from layout rows (top to bottom).
    ///
    /// Each key is adjacent to its left/right neighbours and to the closest
    /// key (plus that key's neighbours) on the rows above and below, found by
    /// relative position. The space bar sits under the bottom row. Uppercase
    /// letters mirror their lowercase entries.
    pub fn from_rows(rows: &[&str]) -> Self {
        let rows: Vec<Vec<char>> = rows.iter().map(|r| r.chars().collect()).collect();
        let mut neighbors: HashMap<char, Vec<char>> = HashMap::new();

        for (row_idx, row) in rows.iter().enumerate() {
            for (key_idx, &key) in row.iter().enumerate() {
                let mut adjacent = same_row(row, key_idx);

                if row_idx > 0 {
                    extend_from_row(&mut adjacent, &rows[row_idx - 1], key_idx, row.len());
                }
                if row_idx + 1 < rows.len() {
                    extend_from_row(&mut adjacent, &rows[row_idx + 1], key_idx, row.len());
                }

                neighbors.insert(key, adjacent);
            }
        }

        if let Some(bottom) = rows.last() {
            for key in bottom {
                neighbors.entry(*key).or_default().push(' ');
            }
            neighbors.insert(' ', bottom.clone());
        }

        let uppercase: Vec<(char, Vec<char>)> = neighbors
            .iter()
            .filter(|(key, _)| key.is_ascii_lowercase())
            .map(|(key, adjacent)| {
                let mirrored = adjacent
                    .iter()
                    .map(|c| if c.is_ascii_lowercase() { c.to_ascii_uppercase() } else { *c })
                    .collect();
                (key.to_ascii_uppercase(), mirrored)
            })
            .collect();
        neighbors.extend(uppercase);

        Self { neighbors }
    }

    /// Build a map from explicit entries
    pub fn from_entries(entries: impl IntoIterator<Item = (char, Vec<char>)>) -> Self {
        Self {
            neighbors: entries.into_iter().collect(),
        }
    }

    /// Keys adjacent to `key`; empty when the key is unknown
    pub fn neighbors(&self, key: char) -> &[char] {
        self.neighbors.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Case-insensitive adjacency test
    pub fn is_adjacent(&self, from: char, to: char) -> bool {
        self.neighbors(from.to_ascii_lowercase())
            .contains(&to.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.neighbors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neighbors.is_empty()
    }
}

fn same_row(row: &[char], idx: usize) -> Vec<char> {
    let mut adjacent = Vec::with_capacity(2);
    if idx > 0 {
        adjacent.push(row[idx - 1]);
    }
    if idx + 1 < row.len() {
        adjacent.push(row[idx + 1]);
    }
    adjacent
}

fn extend_from_row(adjacent: &mut Vec<char>, other: &[char], key_idx: usize, row_len: usize) {
    if other.is_empty() {
        return;
    }
    let relative = key_idx as f64 / row_len as f64;
    let idx = ((relative * other.len() as f64) as usize).min(other.len() - 1);
    adjacent.extend(same_row(other, idx));
    adjacent.push(other[idx]);
}
