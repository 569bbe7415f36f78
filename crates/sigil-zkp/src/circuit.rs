//! # Commitment-Binding Circuit
//!
//! R1CS with exactly one public input, the commitment `c`:
//!
//! ```text
//! w * 1 = c      (w is the prover's witness for c)
//! w * w = s      (s is the witness square)
//! ```
//!
//! The square constraint keeps the witness from being optimized out and
//! gives the proving key a non-trivial QAP. A proof for `c` only verifies
//! against `c` as the public input.

use ark_bn254::Fr;
use ark_relations::lc;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError, Variable};

/// Identifier recorded in the artifact manifest. Keys produced for any other
/// circuit id are refused at load time.
pub const CIRCUIT_ID: &str = "sigil-commitment-binding-v1";

/// Number of public inputs the circuit exposes.
pub const PUBLIC_INPUT_COUNT: usize = 1;

/// The commitment-binding circuit. `commitment` is `None` during setup.
#[derive(Debug, Clone, Copy, Default)]
pub struct SigilCircuit {
    pub commitment: Option<Fr>,
}

impl SigilCircuit {
    /// Shape-only instance for key generation.
    pub fn for_setup() -> Self {
        Self { commitment: None }
    }

    /// Instance carrying an assignment for proving.
    pub fn with_commitment(commitment: Fr) -> Self {
        Self {
            commitment: Some(commitment),
        }
    }
}

impl ConstraintSynthesizer<Fr> for SigilCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError> {
        let value = self.commitment;
        let commitment =
            cs.new_input_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?;
        let witness = cs.new_witness_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?;
        let square = cs.new_witness_variable(|| {
            value
                .map(|v| v * v)
                .ok_or(SynthesisError::AssignmentMissing)
        })?;

        cs.enforce_constraint(lc!() + witness, lc!() + Variable::One, lc!() + commitment)?;
        cs.enforce_constraint(lc!() + witness, lc!() + witness, lc!() + square)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn satisfied_with_assignment() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        SigilCircuit::with_commitment(Fr::from(42u64))
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_constraints(), 2);
        // The constant `1` is counted as an instance variable.
        assert_eq!(cs.num_instance_variables(), 1 + PUBLIC_INPUT_COUNT);
    }

    #[test]
    fn missing_assignment_fails_outside_setup() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        let err = SigilCircuit::for_setup()
            .generate_constraints(cs)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::AssignmentMissing));
    }
}
