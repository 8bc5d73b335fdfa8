use procstore_types::{Cell, ContentHash, Grid, Record};

/// Generator polynomial (Dallas/Maxim).
pub const POLYNOMIAL: i32 = 0x31;

/// Initial register value.
pub const SEED: i32 = 0xFF;

/// Lookup table. Entries are not truncated to a byte: the shift register is
/// a full integer, so high bits survive into the final checksum.
static TABLE: [i32; 256] = build_table();

const fn build_table() -> [i32; 256] {
    let mut table = [0i32; 256];
    let mut k = 0;
    while k < 256 {
        let mut num = k as i32;
        let mut bit = 0;
        while bit < 8 {
            num = if num & 0x80 != 0 {
                (num << 1) ^ POLYNOMIAL
            } else {
                num << 1
            };
            bit += 1;
        }
        table[k] = num;
        k += 1;
    }
    table
}

/// Deterministic checksum over a record's cell values.
///
/// Pure function of the cells in row-major order. Different content may
/// collide; callers scan the bucket rather than assume uniqueness.
pub struct ContentHasher;

impl ContentHasher {
    /// Hash a grid of cells.
    pub fn hash(content: &Grid<Cell>) -> ContentHash {
        Self::hash_values(content.cells().iter().map(|cell| cell.value()))
    }

    /// Hash the content of a record, ignoring its name.
    pub fn hash_record(record: &Record) -> ContentHash {
        Self::hash(record.content())
    }

    /// Hash an arbitrary sequence of 32-bit values.
    pub fn hash_values(values: impl IntoIterator<Item = i32>) -> ContentHash {
        let checksum = values
            .into_iter()
            .flat_map(i32::to_le_bytes)
            .fold(SEED, |current, byte| {
                TABLE[((current ^ byte as i32) as u8) as usize]
            });
        ContentHash::new(checksum)
    }

    /// Verify that `content` produces the expected hash.
    pub fn verify(content: &Grid<Cell>, expected: ContentHash) -> bool {
        Self::hash(content) == expected
    }

    /// The lookup table (for diagnostics).
    pub fn table() -> &'static [i32; 256] {
        &TABLE
    }
}
