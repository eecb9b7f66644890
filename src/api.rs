use crate::breverse::BReverse;
use crate::bytecode_tape::{BtapeGuard, BytecodeTape};

/// Record a multi-output function into a [`BytecodeTape`].
///
/// Returns the tape and the output values at `x`. Inputs occupy tape entries
/// `0..x.len()`; outputs that do not depend on any input are promoted to
/// constant entries so every output has a tape slot.
///
/// ```
/// use distance_approach::{record_multi, Scalar};
///
/// let (tape, values) = record_multi(|x| vec![x[0] * x[1], x[0].sin()], &[2.0, 3.0]);
/// assert_eq!(tape.num_outputs(), 2);
/// assert_eq!(values[0], 6.0);
/// ```
pub fn record_multi(
    f: impl FnOnce(&[BReverse]) -> Vec<BReverse>,
    x: &[f64],
) -> (BytecodeTape, Vec<f64>) {
    let n = x.len();
    let mut tape = BytecodeTape::with_capacity(n * 10);

    // Register inputs.
    let inputs: Vec<BReverse> = x
        .iter()
        .map(|&val| {
            let idx = tape.new_input(val);
            BReverse::from_tape(val, idx)
        })
        .collect();

    let outputs = {
        let _guard = BtapeGuard::new(&mut tape);
        f(&inputs)
    };

    let values: Vec<f64> = outputs.iter().map(|o| o.value).collect();
    let indices: Vec<u32> = outputs.iter().map(|o| o.ensure_on_tape(&mut tape)).collect();
    tape.set_outputs(&indices);

    (tape, values)
}
