// SPDX-License-Identifier: MIT

/// `true` if `n` is `base^k` for some `k >= 1`.
#[inline]
fn is_power_of(mut n: u32, base: u32) -> bool {
    if n < base {
        return false;
    }
    while n % base == 0 {
        n /= base;
    }
    n == 1
}

/// Sparse-superblock rule: groups 0 and 1 always carry a backup, other groups
/// only when their index is a power of 3, 5 or 7.
pub fn is_sparse_super_group(group: u32) -> bool {
    group <= 1 || is_power_of(group, 3) || is_power_of(group, 5) || is_power_of(group, 7)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sparse_groups() {
        let expected = [0, 1, 3, 5, 7, 9, 25, 27, 49, 81, 125, 243, 343];
        let found: alloc::vec::Vec<u32> = (0..400).filter(|&g| is_sparse_super_group(g)).collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_non_powers() {
        for g in [2, 4, 6, 10, 15, 21, 35, 45, 63, 105] {
            assert!(!is_sparse_super_group(g), "group {g}");
        }
    }
}
