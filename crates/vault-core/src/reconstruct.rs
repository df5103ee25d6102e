//! D. Scalar reconstructor — Lagrange interpolation at 0 over the
//! signing set's shares (§4.D), generalized over the two curves this tool
//! supports via the `ScalarField` trait.
//!
//! This mirrors, in shape, the teacher's inline Lagrange interpolation in
//! `keygen/dkg.rs` (`evaluate_polynomial` / `verify_share`), generalized so
//! the same routine drives both the secp256k1 GG20 path and the ed25519
//! EdDSA path.

use crate::error::{Error, Result};
use crate::types::{Curve, RawShare, ReconstructedScalar};
use elliptic_curve::bigint::U256;
use elliptic_curve::ops::Reduce;
use elliptic_curve::sec1::ToEncodedPoint;
use elliptic_curve::Field;
use k256::{ProjectivePoint, Scalar as K256Scalar};

/// A curve's scalar field, abstracted just enough to run Lagrange
/// interpolation and verify the result against a public point.
trait ScalarField: Copy {
    fn reduce_be_bytes(bytes: &[u8]) -> Self;
    fn zero() -> Self;
    fn add(self, other: Self) -> Self;
    fn sub(self, other: Self) -> Self;
    fn mul(self, other: Self) -> Self;
    fn invert(self) -> Option<Self>;
    fn is_zero(self) -> bool;
    fn to_be_bytes(self) -> Vec<u8>;
}

fn be_to_fixed32(bytes: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let len = bytes.len().min(32);
    out[32 - len..].copy_from_slice(&bytes[bytes.len() - len..]);
    out
}

#[derive(Clone, Copy)]
struct Secp256k1Scalar(K256Scalar);

impl ScalarField for Secp256k1Scalar {
    fn reduce_be_bytes(bytes: &[u8]) -> Self {
        let fixed = be_to_fixed32(bytes);
        Secp256k1Scalar(<K256Scalar as Reduce<U256>>::reduce_bytes(&fixed.into()))
    }

    fn zero() -> Self {
        Secp256k1Scalar(K256Scalar::ZERO)
    }

    fn add(self, other: Self) -> Self {
        Secp256k1Scalar(self.0 + other.0)
    }

    fn sub(self, other: Self) -> Self {
        Secp256k1Scalar(self.0 - other.0)
    }

    fn mul(self, other: Self) -> Self {
        Secp256k1Scalar(self.0 * other.0)
    }

    fn invert(self) -> Option<Self> {
        Option::<K256Scalar>::from(self.0.invert()).map(Secp256k1Scalar)
    }

    fn is_zero(self) -> bool {
        bool::from(Field::is_zero(&self.0))
    }

    fn to_be_bytes(self) -> Vec<u8> {
        self.0.to_bytes().to_vec()
    }
}

#[derive(Clone, Copy)]
struct Ed25519Scalar(curve25519_dalek::scalar::Scalar);

impl ScalarField for Ed25519Scalar {
    fn reduce_be_bytes(bytes: &[u8]) -> Self {
        let mut fixed = be_to_fixed32(bytes);
        fixed.reverse(); // curve25519-dalek wants little-endian
        Ed25519Scalar(curve25519_dalek::scalar::Scalar::from_bytes_mod_order(fixed))
    }

    fn zero() -> Self {
        Ed25519Scalar(curve25519_dalek::scalar::Scalar::ZERO)
    }

    fn add(self, other: Self) -> Self {
        Ed25519Scalar(self.0 + other.0)
    }

    fn sub(self, other: Self) -> Self {
        Ed25519Scalar(self.0 - other.0)
    }

    fn mul(self, other: Self) -> Self {
        Ed25519Scalar(self.0 * other.0)
    }

    fn invert(self) -> Option<Self> {
        if self.is_zero() {
            None
        } else {
            Some(Ed25519Scalar(self.0.invert()))
        }
    }

    fn is_zero(self) -> bool {
        self.0 == curve25519_dalek::scalar::Scalar::ZERO
    }

    fn to_be_bytes(self) -> Vec<u8> {
        let mut bytes = self.0.to_bytes();
        bytes.reverse();
        bytes.to_vec()
    }
}

/// Sort shares by ascending id (big-endian byte comparison after normalizing
/// to equal length), and reject duplicate ids before any inversion is
/// attempted.
fn order_and_dedupe(shares: &[RawShare]) -> Result<Vec<&RawShare>> {
    let mut ordered: Vec<&RawShare> = shares.iter().collect();
    ordered.sort_by(|a, b| be_to_fixed32(&a.id).cmp(&be_to_fixed32(&b.id)));

    for window in ordered.windows(2) {
        if be_to_fixed32(&window[0].id) == be_to_fixed32(&window[1].id) {
            return Err(Error::ShareMalformed(
                "duplicate shamir index within signing set".into(),
            ));
        }
    }
    Ok(ordered)
}

fn lagrange_interpolate<F: ScalarField>(ordered: &[&RawShare]) -> Result<F> {
    let ids: Vec<F> = ordered
        .iter()
        .map(|s| F::reduce_be_bytes(&s.id))
        .collect();
    let scalars: Vec<F> = ordered
        .iter()
        .map(|s| F::reduce_be_bytes(&s.scalar))
        .collect();

    let mut total = F::zero();
    for k in 0..ordered.len() {
        let mut lambda = F::reduce_be_bytes(&[1]);
        for j in 0..ordered.len() {
            if j == k {
                continue;
            }
            let denom = ids[j].sub(ids[k]);
            if denom.is_zero() {
                return Err(Error::ShareMalformed(
                    "duplicate shamir index produced a zero denominator".into(),
                ));
            }
            let denom_inv = denom
                .invert()
                .ok_or_else(|| Error::ShareMalformed("non-invertible denominator in Lagrange basis".into()))?;
            lambda = lambda.mul(ids[j]).mul(denom_inv);
        }
        total = total.add(lambda.mul(scalars[k]));
    }

    Ok(total)
}

fn secp256k1_point_matches(scalar: &K256Scalar, expected: &[u8]) -> bool {
    let point = (ProjectivePoint::GENERATOR * scalar).to_affine();
    point.to_encoded_point(true).as_bytes() == expected
}

fn ed25519_point_matches(scalar: &curve25519_dalek::scalar::Scalar, expected: &[u8]) -> bool {
    use curve25519_dalek::constants::ED25519_BASEPOINT_TABLE;
    let point = scalar * &ED25519_BASEPOINT_TABLE;
    point.compress().to_bytes().as_slice() == expected
}

/// Run Lagrange interpolation over (at least) `threshold` shares and verify
/// the result reproduces the vault's advertised aggregated public key.
///
/// When more than `threshold` shares are supplied, a second, independent
/// subset is interpolated as an additional check that the result does not
/// depend on which shares were used (§4.D "additional shares may be used for
/// a second, independent verification pass").
pub fn reconstruct(
    shares: &[RawShare],
    threshold: usize,
    curve: Curve,
    public_key: &[u8],
) -> Result<ReconstructedScalar> {
    if shares.len() < threshold {
        return Err(Error::ThresholdUnmet {
            required: threshold,
            actual: shares.len(),
        });
    }

    let ordered = order_and_dedupe(shares)?;
    let primary: Vec<&RawShare> = ordered.iter().take(threshold).copied().collect();

    let bytes = match curve {
        Curve::Secp256k1 => {
            let d: Secp256k1Scalar = lagrange_interpolate(&primary)?;
            if !secp256k1_point_matches(&d.0, public_key) {
                return Err(Error::ReconstructionMismatch);
            }
            d.to_be_bytes()
        }
        Curve::Ed25519 => {
            let d: Ed25519Scalar = lagrange_interpolate(&primary)?;
            if !ed25519_point_matches(&d.0, public_key) {
                return Err(Error::ReconstructionMismatch);
            }
            d.to_be_bytes()
        }
    };

    // Second, independent verification pass when extra shares were supplied.
    if ordered.len() > threshold {
        let secondary: Vec<&RawShare> = ordered
            .iter()
            .rev()
            .take(threshold)
            .copied()
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect();
        let secondary_bytes = match curve {
            Curve::Secp256k1 => {
                let d: Secp256k1Scalar = lagrange_interpolate(&secondary)?;
                d.to_be_bytes()
            }
            Curve::Ed25519 => {
                let d: Ed25519Scalar = lagrange_interpolate(&secondary)?;
                d.to_be_bytes()
            }
        };
        if secondary_bytes != bytes {
            return Err(Error::ReconstructionMismatch);
        }
    }

    Ok(ReconstructedScalar { curve, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secp_share(id: u8, scalar: K256Scalar) -> RawShare {
        RawShare {
            id: vec![id],
            scalar: scalar.to_bytes().to_vec(),
            public_point: Vec::new(),
        }
    }

    fn secp_fixture(threshold: usize, n: usize) -> (K256Scalar, Vec<u8>, Vec<RawShare>) {
        let mut rng = rand::thread_rng();
        let mut coeffs = Vec::with_capacity(threshold);
        for _ in 0..threshold {
            coeffs.push(K256Scalar::random(&mut rng));
        }
        let secret = coeffs[0];
        let public_key = (ProjectivePoint::GENERATOR * secret)
            .to_affine()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();

        let mut shares = Vec::with_capacity(n);
        for id in 1..=n as u8 {
            let x = K256Scalar::from(u64::from(id));
            let mut acc = K256Scalar::ZERO;
            let mut xp = K256Scalar::ONE;
            for c in &coeffs {
                acc += *c * xp;
                xp *= x;
            }
            shares.push(secp_share(id, acc));
        }
        (secret, public_key, shares)
    }

    #[test]
    fn reconstructs_and_verifies_against_public_key() {
        let (secret, public_key, shares) = secp_fixture(2, 3);
        let result = reconstruct(&shares, 2, Curve::Secp256k1, &public_key).unwrap();
        assert_eq!(result.bytes, secret.to_bytes().to_vec());
    }

    #[test]
    fn extra_shares_do_not_change_result() {
        let (secret, public_key, shares) = secp_fixture(2, 4);
        let result = reconstruct(&shares, 2, Curve::Secp256k1, &public_key).unwrap();
        assert_eq!(result.bytes, secret.to_bytes().to_vec());
    }

    #[test]
    fn permuted_order_does_not_change_result() {
        let (_, public_key, mut shares) = secp_fixture(2, 3);
        shares.reverse();
        let result_a = reconstruct(&shares, 2, Curve::Secp256k1, &public_key).unwrap();
        shares.swap(0, 2);
        let result_b = reconstruct(&shares, 2, Curve::Secp256k1, &public_key).unwrap();
        assert_eq!(result_a.bytes, result_b.bytes);
    }

    #[test]
    fn below_threshold_is_rejected() {
        let (_, public_key, shares) = secp_fixture(3, 3);
        let err = reconstruct(&shares[..2], 3, Curve::Secp256k1, &public_key).unwrap_err();
        assert!(matches!(err, Error::ThresholdUnmet { .. }));
    }

    #[test]
    fn duplicate_ids_fail_before_inversion() {
        let (_, public_key, mut shares) = secp_fixture(2, 2);
        shares[1].id = shares[0].id.clone();
        let err = reconstruct(&shares, 2, Curve::Secp256k1, &public_key).unwrap_err();
        assert!(matches!(err, Error::ShareMalformed(_)));
    }

    #[test]
    fn threshold_one_degenerates_to_the_sole_share() {
        // threshold == 1 degenerates to trivial sharing: the lone share's
        // scalar *is* the private key, but the verification step still runs.
        let mut rng = rand::thread_rng();
        let secret = K256Scalar::random(&mut rng);
        let public_key = (ProjectivePoint::GENERATOR * secret)
            .to_affine()
            .to_encoded_point(true)
            .as_bytes()
            .to_vec();
        let shares = vec![secp_share(1, secret)];

        let result = reconstruct(&shares, 1, Curve::Secp256k1, &public_key).unwrap();
        assert_eq!(result.bytes, secret.to_bytes().to_vec());
    }

    #[test]
    fn tampered_public_key_is_reconstruction_mismatch() {
        let (_, mut public_key, shares) = secp_fixture(2, 2);
        public_key[5] ^= 0xff;
        let err = reconstruct(&shares, 2, Curve::Secp256k1, &public_key).unwrap_err();
        assert!(matches!(err, Error::ReconstructionMismatch));
    }
}
