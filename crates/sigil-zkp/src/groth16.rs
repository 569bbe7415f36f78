//! # Groth16 over BN254
//!
//! The production [`ProofSystem`] backend, built on arkworks. Proofs travel
//! in the snarkjs JSON shape so existing verifiers can consume them:
//!
//! ```text
//! { "pi_a": [x, y, "1"],
//!   "pi_b": [[x.c0, x.c1], [y.c0, y.c1], ["1", "0"]],
//!   "pi_c": [x, y, "1"],
//!   "protocol": "groth16", "curve": "bn128" }
//! ```
//!
//! Every coordinate is a decimal string. Decoding rejects non-reduced
//! coordinates, points off the curve, and points outside the prime-order
//! subgroup before any pairing is computed.

use ark_bn254::{Bn254, Fq, Fq2, Fr, G1Affine, G2Affine};
use ark_ff::PrimeField;
use ark_groth16::{prepare_verifying_key, Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_snark::{CircuitSpecificSetupSNARK, SNARK};
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use serde_json::{json, Value};

use crate::circuit::SigilCircuit;
use crate::commitment::FieldCommitment;
use crate::traits::{ProofError, ProofSystem, VerifyError};

/// Groth16 proof system over the BN254 pairing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Groth16Bn254;

/// Run a circuit-specific trusted setup for [`SigilCircuit`].
pub fn setup<R: RngCore + CryptoRng>(
    rng: &mut R,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), ProofError> {
    Groth16::<Bn254>::circuit_specific_setup(SigilCircuit::for_setup(), rng)
        .map_err(|e| ProofError::CircuitError(e.to_string()))
}

/// Prepare a verifying key for repeated pairing checks.
pub fn prepare(vk: &VerifyingKey<Bn254>) -> PreparedVerifyingKey<Bn254> {
    prepare_verifying_key(vk)
}

impl ProofSystem for Groth16Bn254 {
    const SCHEME: &'static str = "groth16";
    const CURVE: &'static str = "bn128";

    type Proof = Proof<Bn254>;
    type VerifyingKey = PreparedVerifyingKey<Bn254>;
    type ProvingKey = ProvingKey<Bn254>;

    fn prove(
        &self,
        pk: &Self::ProvingKey,
        commitment: &FieldCommitment,
    ) -> Result<(Self::Proof, Vec<FieldCommitment>), ProofError> {
        let value = commitment.to_field();
        let proof = Groth16::<Bn254>::prove(
            pk,
            SigilCircuit::with_commitment(value),
            &mut rand::rngs::OsRng,
        )
        .map_err(|e| ProofError::ProverError(e.to_string()))?;
        Ok((proof, vec![FieldCommitment::from_field(value)]))
    }

    fn verify(
        &self,
        vk: &Self::VerifyingKey,
        proof: &Self::Proof,
        public_inputs: &[FieldCommitment],
    ) -> Result<bool, VerifyError> {
        let expected = vk.vk.gamma_abc_g1.len().saturating_sub(1);
        if public_inputs.len() != expected {
            return Err(VerifyError::KeyMismatch(format!(
                "expected {expected} public inputs, got {}",
                public_inputs.len()
            )));
        }
        let inputs: Vec<Fr> = public_inputs.iter().map(FieldCommitment::to_field).collect();
        Groth16::<Bn254>::verify_with_processed_vk(vk, &inputs, proof)
            .map_err(|e| VerifyError::InvalidProof(e.to_string()))
    }

    fn encode_proof(&self, proof: &Self::Proof) -> Value {
        json!({
            "pi_a": encode_g1(&proof.a),
            "pi_b": encode_g2(&proof.b),
            "pi_c": encode_g1(&proof.c),
            "protocol": Self::SCHEME,
            "curve": Self::CURVE,
        })
    }

    fn decode_proof(&self, value: &Value) -> Result<Self::Proof, VerifyError> {
        let obj = value
            .as_object()
            .ok_or_else(|| VerifyError::InvalidProof("proof must be a JSON object".into()))?;
        for (field, want) in [("protocol", Self::SCHEME), ("curve", Self::CURVE)] {
            if let Some(got) = obj.get(field) {
                if got.as_str() != Some(want) {
                    return Err(VerifyError::InvalidProof(format!(
                        "unsupported {field}: {got}"
                    )));
                }
            }
        }
        let field = |name: &str| {
            obj.get(name)
                .ok_or_else(|| VerifyError::InvalidProof(format!("missing {name}")))
        };
        Ok(Proof {
            a: decode_g1(field("pi_a")?)?,
            b: decode_g2(field("pi_b")?)?,
            c: decode_g1(field("pi_c")?)?,
        })
    }
}

fn fq_to_decimal(f: &Fq) -> String {
    BigUint::from(f.into_bigint()).to_string()
}

fn encode_g1(p: &G1Affine) -> Value {
    if p.infinity {
        return json!(["0", "1", "0"]);
    }
    json!([fq_to_decimal(&p.x), fq_to_decimal(&p.y), "1"])
}

fn encode_g2(p: &G2Affine) -> Value {
    if p.infinity {
        return json!([["0", "0"], ["1", "0"], ["0", "0"]]);
    }
    json!([
        [fq_to_decimal(&p.x.c0), fq_to_decimal(&p.x.c1)],
        [fq_to_decimal(&p.y.c0), fq_to_decimal(&p.y.c1)],
        ["1", "0"]
    ])
}

fn parse_fq(v: &Value) -> Result<Fq, VerifyError> {
    let s = v
        .as_str()
        .ok_or_else(|| VerifyError::InvalidProof(format!("coordinate must be a string: {v}")))?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VerifyError::InvalidProof(format!("coordinate is not decimal: {s:?}")));
    }
    let n = BigUint::parse_bytes(s.as_bytes(), 10)
        .ok_or_else(|| VerifyError::InvalidProof(format!("coordinate is not decimal: {s:?}")))?;
    if n >= BigUint::from(Fq::MODULUS) {
        return Err(VerifyError::InvalidProof("coordinate exceeds base field".into()));
    }
    Ok(Fq::from(n))
}

fn parse_fq2(v: &Value) -> Result<Fq2, VerifyError> {
    match v.as_array().map(Vec::as_slice) {
        Some([c0, c1]) => Ok(Fq2::new(parse_fq(c0)?, parse_fq(c1)?)),
        _ => Err(VerifyError::InvalidProof("expected an Fq2 pair".into())),
    }
}

fn decode_g1(v: &Value) -> Result<G1Affine, VerifyError> {
    let [x, y, z] = match v.as_array().map(Vec::as_slice) {
        Some([x, y, z]) => [x, y, z],
        _ => return Err(VerifyError::InvalidProof("G1 point needs 3 coordinates".into())),
    };
    let z = parse_fq(z)?;
    if z == Fq::from(0u64) {
        return Ok(G1Affine::identity());
    }
    if z != Fq::from(1u64) {
        return Err(VerifyError::InvalidProof("G1 point must be affine".into()));
    }
    let p = G1Affine::new_unchecked(parse_fq(x)?, parse_fq(y)?);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(VerifyError::InvalidProof("G1 point not in subgroup".into()));
    }
    Ok(p)
}

fn decode_g2(v: &Value) -> Result<G2Affine, VerifyError> {
    let [x, y, z] = match v.as_array().map(Vec::as_slice) {
        Some([x, y, z]) => [x, y, z],
        _ => return Err(VerifyError::InvalidProof("G2 point needs 3 coordinates".into())),
    };
    let z = parse_fq2(z)?;
    if z == Fq2::new(Fq::from(0u64), Fq::from(0u64)) {
        return Ok(G2Affine::identity());
    }
    if z != Fq2::new(Fq::from(1u64), Fq::from(0u64)) {
        return Err(VerifyError::InvalidProof("G2 point must be affine".into()));
    }
    let p = G2Affine::new_unchecked(parse_fq2(x)?, parse_fq2(y)?);
    if !p.is_on_curve() || !p.is_in_correct_subgroup_assuming_on_curve() {
        return Err(VerifyError::InvalidProof("G2 point not in subgroup".into()));
    }
    Ok(p)
}
