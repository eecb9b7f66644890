use crate::opcode::{self, OpCode};

impl super::BytecodeTape {
    /// Re-evaluate the tape at new inputs (forward sweep).
    ///
    /// Overwrites `values` in-place, no allocation.
    pub fn forward(&mut self, inputs: &[f64]) {
        assert_eq!(
            inputs.len(),
            self.num_inputs as usize,
            "wrong number of inputs"
        );

        self.values[..inputs.len()].copy_from_slice(inputs);

        for i in self.num_inputs as usize..self.opcodes.len() {
            match self.opcodes[i] {
                OpCode::Input | OpCode::Const => continue,
                op => {
                    let (a, b) = self.operands(i, &self.values);
                    self.values[i] = opcode::eval_forward(op, a, b);
                }
            }
        }
    }

    /// Whether every output of the last sweep is finite.
    pub fn outputs_finite(&self) -> bool {
        self.output_indices
            .iter()
            .all(|&idx| self.values[idx as usize].is_finite())
    }

    /// Index of the first non-finite entry among the primal values, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.values.iter().position(|v| !v.is_finite())
    }
}
