//! UCI part-2 size derivation
//!
//! The size of a CSI part-2 report is not fixed: it is a function of fields
//! carried in part 1 (typically the rank indicator). The part-1 decoder hands
//! the unpacked payload (one bit per byte) to [`uci_part2_get_size`], which
//! extracts the configured bit-fields and looks the resulting index up in a
//! size map.

/// One bit-field of the part-1 payload contributing to the map index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UciPart2Parameter {
    /// First bit of the field within the part-1 payload.
    pub offset: usize,
    /// Field width in bits.
    pub width: usize,
}

/// One independently-sized chunk of the part-2 payload.
#[derive(Debug, Clone, Default)]
pub struct UciPart2Entry {
    /// Fields concatenated (MSB first) into the map index.
    pub parameters: Vec<UciPart2Parameter>,
    /// Part-2 size in bits for every possible index value.
    pub map: Vec<u16>,
}

/// Full description of how part-1 contents determine the part-2 size.
#[derive(Debug, Clone, Default)]
pub struct UciPart2SizeDescription {
    pub entries: Vec<UciPart2Entry>,
}

/// Total UCI part-2 size in bits for the given unpacked part-1 payload.
///
/// `csi_part1` holds one bit per byte; only the least significant bit of
/// each byte is read. Field widths and the map dimensions are a caller
/// contract: each entry's map must have one element per index value.
pub fn uci_part2_get_size(csi_part1: &[u8], description: &UciPart2SizeDescription) -> usize {
    let mut size = 0;
    for entry in &description.entries {
        let mut index = 0usize;
        for param in &entry.parameters {
            assert!(
                param.offset + param.width <= csi_part1.len(),
                "uci part2 parameter exceeds part1 payload"
            );
            for bit in 0..param.width {
                index = (index << 1) | (csi_part1[param.offset + bit] & 1) as usize;
            }
        }
        assert!(index < entry.map.len(), "uci part2 map is too small for index {index}");
        size += entry.map[index] as usize;
    }
    size
}

#[cfg(test)]
mod tests {
    use super::*;

    // Two-port CSI report: 1-bit RI at offset 0, part-2 size 2 bits for one
    // layer and 1 bit for two layers.
    #[test]
    fn test_one_bit_ri_lookup() {
        let description = UciPart2SizeDescription {
            entries: vec![UciPart2Entry {
                parameters: vec![UciPart2Parameter { offset: 0, width: 1 }],
                map: vec![2, 1],
            }],
        };

        // Upper bits of each payload byte must be ignored.
        let mut csi_part1 = [0xffu8; 5];

        csi_part1[0] = 0;
        assert_eq!(uci_part2_get_size(&csi_part1, &description), 2);

        csi_part1[0] = 1;
        assert_eq!(uci_part2_get_size(&csi_part1, &description), 1);
    }

    // Four-port CSI report: 2-bit RI mapped to a 4-entry table.
    #[test]
    fn test_two_bit_ri_lookup() {
        let description = UciPart2SizeDescription {
            entries: vec![UciPart2Entry {
                parameters: vec![UciPart2Parameter { offset: 0, width: 2 }],
                map: vec![4, 4, 3, 3],
            }],
        };

        let mut csi_part1 = [0xffu8; 5];
        for (ri, expected) in [(0u8, 4), (1, 4), (2, 3), (3, 3)] {
            csi_part1[0] = (ri >> 1) & 1;
            csi_part1[1] = ri & 1;
            assert_eq!(
                uci_part2_get_size(&csi_part1, &description),
                expected,
                "wrong size for ri value {ri}"
            );
        }
    }

    #[test]
    fn test_multiple_entries_are_summed() {
        let description = UciPart2SizeDescription {
            entries: vec![
                UciPart2Entry {
                    parameters: vec![UciPart2Parameter { offset: 0, width: 1 }],
                    map: vec![2, 1],
                },
                UciPart2Entry {
                    parameters: vec![UciPart2Parameter { offset: 1, width: 1 }],
                    map: vec![10, 20],
                },
            ],
        };

        let csi_part1 = [1u8, 1, 0, 0, 0];
        assert_eq!(uci_part2_get_size(&csi_part1, &description), 1 + 20);
    }

    #[test]
    fn test_empty_description_is_zero_sized() {
        let csi_part1 = [0u8; 4];
        assert_eq!(uci_part2_get_size(&csi_part1, &UciPart2SizeDescription::default()), 0);
    }
}
