//! Predicate compilation.
//!
//! A query compiles into a flat postfix program: atom tests push a boolean,
//! operators pop their operands and push the result. Evaluating the program
//! needs a value stack as deep as the query is wide, never the call stack.

use std::fmt;

use crate::ast::{BinaryOperator, Query, UnaryOperator};
use crate::atom::Atom;

/// A compiled atom.
pub type Matcher<T> = Box<dyn Fn(&T) -> bool + Send + Sync>;

enum Instruction<T> {
    Test(Matcher<T>),
    Not,
    And,
    Or,
    AndNot,
}

/// A compiled query.
///
/// A predicate is a pure function of its target: it owns everything it needs
/// and can be shared across threads.
pub struct Predicate<T> {
    program: Vec<Instruction<T>>,
    stack_depth: usize,
}

impl<T> Predicate<T> {
    /// A predicate matching everything.
    #[must_use]
    pub const fn always() -> Self {
        Self {
            program: Vec::new(),
            stack_depth: 0,
        }
    }

    /// Evaluate the predicate.
    pub fn matches(&self, target: &T) -> bool {
        let mut stack: Vec<bool> = Vec::with_capacity(self.stack_depth);

        for instruction in &self.program {
            match instruction {
                Instruction::Test(test) => stack.push(test(target)),
                Instruction::Not => {
                    if let Some(top) = stack.last_mut() {
                        *top = !*top;
                    }
                }
                Instruction::And | Instruction::Or | Instruction::AndNot => {
                    let right = stack.pop().unwrap_or(true);
                    let left = stack.pop().unwrap_or(true);
                    stack.push(match instruction {
                        Instruction::And => left && right,
                        Instruction::Or => left || right,
                        _ => left && !right,
                    });
                }
            }
        }

        stack.pop().unwrap_or(true)
    }

    /// Number of instructions in the compiled program.
    #[must_use]
    pub fn len(&self) -> usize {
        self.program.len()
    }

    /// Whether the predicate is the trivial "match everything" program.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.program.is_empty()
    }
}

impl<T> Default for Predicate<T> {
    fn default() -> Self {
        Self::always()
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("instructions", &self.program.len())
            .field("stack_depth", &self.stack_depth)
            .finish()
    }
}

enum Emit<'q, A: Default, T> {
    Visit(&'q Query<A>),
    Push(Instruction<T>),
}

/// Compile a query into a predicate over its atoms' target.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use tally_core::VoucherDetail;
/// use tally_query::{compile, DetailAtom, Query};
///
/// let query = Query::subtract(
///     Query::atom(DetailAtom::new().with_title(6602)),
///     Query::atom(DetailAtom::new().with_content("rent")),
/// );
/// let predicate = compile(&query);
///
/// assert!(predicate.matches(&VoucherDetail::new(6602, dec!(30)).with_content("lunch")));
/// assert!(!predicate.matches(&VoucherDetail::new(6602, dec!(900)).with_content("rent")));
/// ```
pub fn compile<A: Atom>(query: &Query<A>) -> Predicate<A::Target> {
    let mut program = Vec::new();
    let mut work: Vec<Emit<'_, A, A::Target>> = vec![Emit::Visit(query)];
    let mut depth = 0usize;
    let mut stack_depth = 0usize;

    while let Some(item) = work.pop() {
        match item {
            Emit::Visit(Query::Atom(atom)) => {
                depth += 1;
                stack_depth = stack_depth.max(depth);
                program.push(Instruction::Test(atom.compile()));
            }
            Emit::Visit(Query::Unary(node)) => {
                if node.op == UnaryOperator::Complement {
                    work.push(Emit::Push(Instruction::Not));
                }
                work.push(Emit::Visit(&node.operand));
            }
            Emit::Visit(Query::Binary(node)) => {
                if let Some(right) = &node.right {
                    work.push(Emit::Push(match node.op {
                        BinaryOperator::Union => Instruction::Or,
                        BinaryOperator::Intersect => Instruction::And,
                        BinaryOperator::Subtract => Instruction::AndNot,
                    }));
                    work.push(Emit::Visit(right));
                }
                work.push(Emit::Visit(&node.left));
            }
            Emit::Push(instruction) => {
                if !matches!(instruction, Instruction::Not) {
                    depth = depth.saturating_sub(1);
                }
                program.push(instruction);
            }
        }
    }

    Predicate {
        program,
        stack_depth,
    }
}
