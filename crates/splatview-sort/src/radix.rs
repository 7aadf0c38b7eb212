//! Linear-time byte-bucket sorting over fixed-width keys.
//!
//! LSB-first radix passes with 256 bins. All byte-position histograms are
//! filled in a single counting pass, then scatter passes alternate between
//! the input and a caller-owned scratch buffer, ending back in the input.

/// Sort `input` ascending. `scratch` is resized to match and reused across
/// calls; its contents are meaningless afterwards.
pub fn radix_sort_u32(input: &mut [u32], scratch: &mut Vec<u32>) {
    if input.len() < 2 {
        return;
    }
    scratch.resize(input.len(), 0);
    let output = scratch.as_mut_slice();

    let mut count = [0usize; 256 * 4];
    for &val in input.iter() {
        count[(val & 0xff) as usize] += 1;
        count[((val >> 8) & 0xff) as usize + 256] += 1;
        count[((val >> 16) & 0xff) as usize + 512] += 1;
        count[((val >> 24) & 0xff) as usize + 768] += 1;
    }
    prefix_sums(&mut count);

    scatter_u32(input, output, &mut count, 0, 0);
    scatter_u32(output, input, &mut count, 8, 256);
    scatter_u32(input, output, &mut count, 16, 512);
    scatter_u32(output, input, &mut count, 24, 768);
}

/// Sort `input` ascending, eight byte passes.
pub fn radix_sort_u64(input: &mut [u64], scratch: &mut Vec<u64>) {
    if input.len() < 2 {
        return;
    }
    scratch.resize(input.len(), 0);
    let output = scratch.as_mut_slice();

    let mut count = [0usize; 256 * 8];
    for &val in input.iter() {
        count[(val & 0xff) as usize] += 1;
        count[((val >> 8) & 0xff) as usize + 256] += 1;
        count[((val >> 16) & 0xff) as usize + 512] += 1;
        count[((val >> 24) & 0xff) as usize + 768] += 1;
        count[((val >> 32) & 0xff) as usize + 1024] += 1;
        count[((val >> 40) & 0xff) as usize + 1280] += 1;
        count[((val >> 48) & 0xff) as usize + 1536] += 1;
        count[((val >> 56) & 0xff) as usize + 1792] += 1;
    }
    prefix_sums(&mut count);

    scatter_u64(input, output, &mut count, 0, 0);
    scatter_u64(output, input, &mut count, 8, 256);
    scatter_u64(input, output, &mut count, 16, 512);
    scatter_u64(output, input, &mut count, 24, 768);
    scatter_u64(input, output, &mut count, 32, 1024);
    scatter_u64(output, input, &mut count, 40, 1280);
    scatter_u64(input, output, &mut count, 48, 1536);
    scatter_u64(output, input, &mut count, 56, 1792);
}

/// Signed sort via the unsigned kernel: offset by the sign bit, sort,
/// offset back.
pub fn radix_sort_i32(input: &mut [i32], scratch: &mut Vec<u32>) {
    let bits: &mut [u32] = bytemuck::cast_slice_mut(input);
    for v in bits.iter_mut() {
        *v = v.wrapping_add(0x8000_0000);
    }
    radix_sort_u32(bits, scratch);
    for v in bits.iter_mut() {
        *v = v.wrapping_sub(0x8000_0000);
    }
}

pub fn radix_sort_i64(input: &mut [i64], scratch: &mut Vec<u64>) {
    let bits: &mut [u64] = bytemuck::cast_slice_mut(input);
    for v in bits.iter_mut() {
        *v = v.wrapping_add(0x8000_0000_0000_0000);
    }
    radix_sort_u64(bits, scratch);
    for v in bits.iter_mut() {
        *v = v.wrapping_sub(0x8000_0000_0000_0000);
    }
}

/// Float sort via the unsigned kernel and the monotonic bit transform.
pub fn radix_sort_f32(input: &mut [f32], scratch: &mut Vec<u32>) {
    let bits: &mut [u32] = bytemuck::cast_slice_mut(input);
    for v in bits.iter_mut() {
        *v = f32_sort_key(*v);
    }
    radix_sort_u32(bits, scratch);
    for v in bits.iter_mut() {
        *v = f32_from_sort_key(*v);
    }
}

/// Map raw f32 bits to a u32 whose unsigned order matches the float order.
///
/// Negative floats (sign bit set) flip every bit; non-negative floats set
/// the sign bit. The result totally orders floats, NaNs at the extremes.
#[inline]
pub fn f32_sort_key(bits: u32) -> u32 {
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits | 0x8000_0000
    }
}

/// Inverse of [`f32_sort_key`].
#[inline]
pub fn f32_from_sort_key(key: u32) -> u32 {
    if key & 0x8000_0000 != 0 {
        key ^ 0x8000_0000
    } else {
        !key
    }
}

/// Exclusive prefix sums over each 256-bin block in place.
fn prefix_sums(count: &mut [usize]) {
    for block in count.chunks_exact_mut(256) {
        let mut sum = 0usize;
        for bin in block.iter_mut() {
            let t = *bin;
            *bin = sum;
            sum += t;
        }
    }
}

fn scatter_u32(src: &[u32], dst: &mut [u32], count: &mut [usize], shift: u32, offset: usize) {
    for &val in src {
        let bin = ((val >> shift) & 0xff) as usize + offset;
        dst[count[bin]] = val;
        count[bin] += 1;
    }
}

fn scatter_u64(src: &[u64], dst: &mut [u64], count: &mut [usize], shift: u32, offset: usize) {
    for &val in src {
        let bin = ((val >> shift) & 0xff) as usize + offset;
        dst[count[bin]] = val;
        count[bin] += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Lcg(u64);

    impl Lcg {
        fn next_u32(&mut self) -> u32 {
            self.0 = self
                .0
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            (self.0 >> 32) as u32
        }

        fn next_u64(&mut self) -> u64 {
            ((self.next_u32() as u64) << 32) | self.next_u32() as u64
        }
    }

    const SIZES: [usize; 5] = [0, 1, 2, 1000, 100_000];

    #[test]
    fn u32_matches_comparison_sort() {
        let mut rng = Lcg(7);
        let mut scratch = Vec::new();
        for n in SIZES {
            let mut data: Vec<u32> = (0..n).map(|_| rng.next_u32()).collect();
            let mut expected = data.clone();
            expected.sort_unstable();

            radix_sort_u32(&mut data, &mut scratch);
            assert_eq!(data, expected, "mismatch at n={n}");
        }
    }

    #[test]
    fn u64_matches_comparison_sort() {
        let mut rng = Lcg(11);
        let mut scratch = Vec::new();
        for n in SIZES {
            let mut data: Vec<u64> = (0..n).map(|_| rng.next_u64()).collect();
            let mut expected = data.clone();
            expected.sort_unstable();

            radix_sort_u64(&mut data, &mut scratch);
            assert_eq!(data, expected, "mismatch at n={n}");
        }
    }

    #[test]
    fn i32_orders_negatives_first() {
        let mut rng = Lcg(13);
        let mut scratch = Vec::new();
        for n in [2, 1000] {
            let mut data: Vec<i32> = (0..n).map(|_| rng.next_u32() as i32).collect();
            let mut expected = data.clone();
            expected.sort_unstable();

            radix_sort_i32(&mut data, &mut scratch);
            assert_eq!(data, expected, "mismatch at n={n}");
        }

        let mut small = vec![3, -1, 0, i32::MIN, i32::MAX, -7];
        radix_sort_i32(&mut small, &mut scratch);
        assert_eq!(small, vec![i32::MIN, -7, -1, 0, 3, i32::MAX]);
    }

    #[test]
    fn i64_orders_negatives_first() {
        let mut rng = Lcg(17);
        let mut scratch = Vec::new();
        let mut data: Vec<i64> = (0..1000).map(|_| rng.next_u64() as i64).collect();
        let mut expected = data.clone();
        expected.sort_unstable();

        radix_sort_i64(&mut data, &mut scratch);
        assert_eq!(data, expected);
    }

    #[test]
    fn f32_matches_total_order() {
        let mut rng = Lcg(19);
        let mut scratch = Vec::new();
        for n in SIZES {
            let mut data: Vec<f32> = (0..n)
                .map(|_| (rng.next_u32() as f32 / u32::MAX as f32) * 2000.0 - 1000.0)
                .collect();
            let mut expected = data.clone();
            expected.sort_unstable_by(f32::total_cmp);

            radix_sort_f32(&mut data, &mut scratch);
            let got: Vec<u32> = data.iter().map(|v| v.to_bits()).collect();
            let want: Vec<u32> = expected.iter().map(|v| v.to_bits()).collect();
            assert_eq!(got, want, "mismatch at n={n}");
        }
    }

    #[test]
    fn f32_handles_signs_zeros_and_infinities() {
        let mut scratch = Vec::new();
        let mut data = vec![1.5f32, -2.0, 0.0, -0.0, f32::INFINITY, f32::NEG_INFINITY, 3.25];
        let mut expected = data.clone();
        expected.sort_unstable_by(f32::total_cmp);

        radix_sort_f32(&mut data, &mut scratch);
        let got: Vec<u32> = data.iter().map(|v| v.to_bits()).collect();
        let want: Vec<u32> = expected.iter().map(|v| v.to_bits()).collect();
        assert_eq!(got, want);
    }

    #[test]
    fn sort_key_transform_is_monotonic_and_invertible() {
        let values = [
            f32::NEG_INFINITY,
            -1000.5,
            -1.0,
            -f32::MIN_POSITIVE,
            -0.0,
            0.0,
            f32::MIN_POSITIVE,
            1.0,
            9999.75,
            f32::INFINITY,
        ];
        let keys: Vec<u32> = values.iter().map(|v| f32_sort_key(v.to_bits())).collect();
        for pair in keys.windows(2) {
            assert!(pair[0] <= pair[1], "keys must ascend with float order");
        }
        for v in values {
            assert_eq!(f32_from_sort_key(f32_sort_key(v.to_bits())), v.to_bits());
        }
    }

    #[test]
    fn sorted_input_stays_sorted() {
        let mut scratch = Vec::new();
        let mut data: Vec<u32> = (0..1000).map(|i| i * 3).collect();
        let expected = data.clone();
        radix_sort_u32(&mut data, &mut scratch);
        assert_eq!(data, expected);
    }
}
