#![warn(missing_docs)]
/*!

`valnum` computes **value numbers** for the nodes of an expression graph and
answers the reverse question: given a number, which nodes share it (the
**congruence class**)?

Two nodes with equal value numbers are asserted semantically interchangeable.
The number itself carries no meaning beyond equality; magnitudes are not
stable across runs or versions.

The crate is a library core with three layers:

- [`VnTable`]: the bidirectional entity ↔ value-number store. One entity maps
  to at most one number; one number maps to many entities.
- [`ValueNumbering`]: assigns numbers by structural hashing — an operation's
  number is derived from its opcode and its operands' numbers, with
  commutative operands canonicalized and cyclic operand chains broken by
  temporary numbers.
- [`congruence_classes`]: batch congruence queries over a table, with a
  choice of sequential, deduplicated, and `rayon`-parallel strategies.

Graph building and whatever consumes the congruence information (redundancy
elimination, analysis passes, drivers) live outside this crate; [`ExprGraph`]
is provided as a minimal arena for callers that don't already own a graph
representation.

## Logging

Many parts of `valnum` dump useful logging info using the
[`log`](https://docs.rs/log/) crate. The easiest way to see this info is to
use the [`env_logger`](https://docs.rs/env_logger/) crate in your binary or
test. The simplest way to enable `env_logger` is to put the following line
near the top of your `main`: `env_logger::init();`. Then, set the environment
variable `RUST_LOG=valnum=info`, or use `warn` or `debug` instead of info
for less or more logging.

## Example

```
use valnum::{ExprGraph, ValueNumbering};

let mut graph = ExprGraph::default();
let a = graph.opaque();
let b = graph.opaque();
let x = graph.operation("add", true, vec![a, b]);
let y = graph.operation("add", true, vec![b, a]);

let mut vn = ValueNumbering::default();
assert_eq!(vn.value_number(&graph, x), vn.value_number(&graph, y));
```

*/

mod batch;
mod graph;
mod number;
mod table;
mod util;

/// A value number: an unsigned integer label over entities.
///
/// Equal labels assert that the labeled entities are semantically
/// interchangeable. Only equality is meaningful; the magnitude of a
/// [`ValueNumber`] is an implementation detail.
#[derive(Clone, Copy, Default, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct ValueNumber(u64);

impl From<u64> for ValueNumber {
    fn from(n: u64) -> ValueNumber {
        ValueNumber(n)
    }
}

impl From<ValueNumber> for u64 {
    fn from(vn: ValueNumber) -> u64 {
        vn.0
    }
}

impl std::fmt::Debug for ValueNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ValueNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub use {
    batch::{congruence_classes, BatchStrategy},
    graph::{EntityId, ExprGraph, ExprSource, NodeKind, ScopeId},
    number::ValueNumbering,
    table::{Congruents, VnTable},
    util::Symbol,
};

#[cfg(test)]
fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
