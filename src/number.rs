use std::hash::{Hash, Hasher};

use fxhash::FxHasher;
use log::{debug, trace};

use crate::graph::{ExprSource, NodeKind};
use crate::table::Congruents;
use crate::util::HashSet;
use crate::{ValueNumber, VnTable};

// Kind tags fed into the structural hash so the three structural shapes
// cannot collide with each other on equal field bits.
const TAG_CONSTANT: u8 = 0;
const TAG_PARAMETER: u8 = 1;
const TAG_OPERATION: u8 = 2;

/// Assigns value numbers to graph nodes by structural hashing, memoized in a
/// [`VnTable`].
///
/// Numbering follows the node's [`NodeKind`]:
///
/// - constants are numbered by content, so equal constants are congruent;
/// - parameters are numbered by (scope, position);
/// - operations combine the opcode with the operands' value numbers,
///   computed recursively, sorting the two operand numbers first for
///   commutative binary operations;
/// - opaque nodes draw a fresh number from a per-instance counter.
///
/// # Cycles
///
/// A node whose operand chain leads back to itself would recurse forever, so
/// re-entering a node that is already being computed mints a fresh temporary
/// number for that occurrence and returns immediately. The node's own entry
/// is overwritten with its structural number once the outer computation
/// finishes, but the temporary leaks into the hashes of the nodes along the
/// back-edge: equal cyclic regions are *not* merged. This is a deliberate
/// approximation, not a fixed-point congruence algorithm; callers wanting
/// tighter numbering of cyclic regions must re-run after the first pass.
///
/// # Threading
///
/// A `ValueNumbering` is single-threaded: the in-progress set it uses for
/// cycle detection is per-instance state. Number disjoint regions on
/// separate instances (merging tables afterwards) rather than sharing one
/// instance across threads. The finished [`table`](ValueNumbering::table)
/// may be read from many threads at once.
#[derive(Debug, Clone)]
pub struct ValueNumbering<E> {
    table: VnTable<E>,
    next_vn: u64,
    computing: HashSet<E>,
}

impl<E> Default for ValueNumbering<E> {
    fn default() -> Self {
        ValueNumbering {
            table: VnTable::default(),
            next_vn: 1,
            computing: HashSet::default(),
        }
    }
}

impl<E: Copy + Eq + Hash> ValueNumbering<E> {
    /// Creates an empty numbering with its fresh-number counter at its
    /// initial value.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value number for `entity`, computing and recording it if
    /// the table doesn't have one yet.
    ///
    /// Repeat calls are idempotent: once recorded, the number is returned
    /// unchanged with no further mutation.
    pub fn value_number<S>(&mut self, source: &S, entity: E) -> ValueNumber
    where
        S: ExprSource<Entity = E>,
    {
        if let Some(vn) = self.table.value(entity) {
            return vn;
        }

        if self.computing.contains(&entity) {
            // Back-edge: hand out a throwaway number to break the recursion.
            let vn = self.fresh();
            debug!("Cycle detected, assigning temporary vn {}", vn);
            self.table.insert_or_replace(entity, vn);
            return vn;
        }

        self.computing.insert(entity);
        let vn = self.compute(source, entity);
        self.table.insert_or_replace(entity, vn);
        let was_computing = self.computing.remove(&entity);
        assert!(
            was_computing,
            "finished computing an entity that was never marked in progress"
        );
        vn
    }

    /// Returns `true` if `a` and `b` receive equal value numbers.
    pub fn congruent<S>(&mut self, source: &S, a: E, b: E) -> bool
    where
        S: ExprSource<Entity = E>,
    {
        self.value_number(source, a) == self.value_number(source, b)
    }

    /// Iterates over every entity currently sharing `vn`.
    ///
    /// Live view with the same caveats as [`VnTable::congruence`].
    pub fn congruence_class(&self, vn: ValueNumber) -> Congruents<'_, E> {
        self.table.congruence(vn)
    }

    /// Read-only access to the underlying table, e.g. for batch congruence
    /// queries via [`congruence_classes`](crate::congruence_classes).
    pub fn table(&self) -> &VnTable<E> {
        &self.table
    }

    /// Drops all recorded numbers and resets the fresh-number counter, so a
    /// rebuilt graph numbers exactly as it did on a fresh instance.
    ///
    /// # Panics
    ///
    /// Must not be called while a [`value_number`](ValueNumbering::value_number)
    /// call is in progress on this instance.
    pub fn clear(&mut self) {
        assert!(
            self.computing.is_empty(),
            "clear called during an in-flight value number computation"
        );
        self.table.clear();
        self.next_vn = 1;
    }

    fn fresh(&mut self) -> ValueNumber {
        let vn = ValueNumber::from(self.next_vn);
        self.next_vn += 1;
        vn
    }

    fn compute<S>(&mut self, source: &S, entity: E) -> ValueNumber
    where
        S: ExprSource<Entity = E>,
    {
        match source.classify(entity) {
            NodeKind::Constant { content } => structural_hash((TAG_CONSTANT, content)),
            NodeKind::Parameter { scope, index } => {
                structural_hash((TAG_PARAMETER, scope, index))
            }
            NodeKind::Operation {
                op,
                commutative,
                operands,
            } => {
                let mut vns: Vec<ValueNumber> = operands
                    .iter()
                    .map(|&operand| self.value_number(source, operand))
                    .collect();
                if commutative && vns.len() == 2 && vns[0] > vns[1] {
                    vns.swap(0, 1);
                }
                trace!("Hashing op {:?} over operand vns {:?}", op, vns);
                structural_hash((TAG_OPERATION, op, vns))
            }
            NodeKind::Opaque => self.fresh(),
        }
    }
}

fn structural_hash(parts: impl Hash) -> ValueNumber {
    let mut hasher = FxHasher::default();
    parts.hash(&mut hasher);
    ValueNumber::from(hasher.finish())
}
