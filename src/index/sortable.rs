//! Order-preserving encoding of numbers into value slots.
//!
//! Encoded values compare byte-wise in the same order as the numbers they
//! encode, so range filters and sorting work on the raw slot bytes.

const SIGN_BIT: u64 = 1 << 63;

pub fn sortable_serialise(value: f64) -> Vec<u8> {
    // -0.0 and 0.0 must encode identically
    let value = if value == 0.0 { 0.0 } else { value };
    let bits = value.to_bits();
    let ordered = if bits & SIGN_BIT != 0 { !bits } else { bits ^ SIGN_BIT };
    ordered.to_be_bytes().to_vec()
}

pub fn sortable_unserialise(bytes: &[u8]) -> Option<f64> {
    let raw: [u8; 8] = bytes.try_into().ok()?;
    let ordered = u64::from_be_bytes(raw);
    let bits = if ordered & SIGN_BIT != 0 { ordered ^ SIGN_BIT } else { !ordered };
    Some(f64::from_bits(bits))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_matches_numeric_order() {
        let values = [f64::NEG_INFINITY, -1e9, -5.2, -0.001, 0.0, 1e-300, 5.2, 97.3, 1e9, f64::INFINITY];
        let encoded: Vec<Vec<u8>> = values.iter().map(|v| sortable_serialise(*v)).collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn decodes_what_it_encodes() {
        for v in [5.2, -3.75, 0.0, 2021.0, f64::MAX] {
            assert_eq!(sortable_unserialise(&sortable_serialise(v)), Some(v));
        }
        assert_eq!(sortable_serialise(-0.0), sortable_serialise(0.0));
        assert_eq!(sortable_unserialise(b"short"), None);
    }
}
