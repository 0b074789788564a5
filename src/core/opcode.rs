//! Operation codes carried by graph nodes

use std::fmt;

/// Possible operations of a node in the operation graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// `abs(a)`
    Abs,
    /// `acos(a)`
    Acos,
    /// `a + b`
    Add,
    /// Flattened chain `a ± b ± c ...` (optimizer output only)
    AddSub,
    /// Reference to another operation (independent-variable elimination)
    Alias,
    /// `asin(a)`
    Asin,
    /// `atan(a)`
    Atan,
    /// `left < right ? if_true : if_false`
    ComLt,
    /// `left <= right ? if_true : if_false`
    ComLe,
    /// `left == right ? if_true : if_false`
    ComEq,
    /// `left >= right ? if_true : if_false`
    ComGe,
    /// `left > right ? if_true : if_false`
    ComGt,
    /// `left != right ? if_true : if_false`
    ComNe,
    /// `cosh(a)`
    Cosh,
    /// `cos(a)`
    Cos,
    /// `a / b`
    Div,
    /// `exp(a)`
    Exp,
    /// Independent variable
    Inv,
    /// `log(a)`
    Log,
    /// `a * b`
    Mul,
    /// Flattened chain `a */ b */ c ...` (optimizer output only)
    MulDiv,
    /// `pow(a, b)`
    Pow,
    /// `a > 0 ? 1 : (a == 0 ? 0 : -1)`
    Sign,
    /// `sinh(a)`
    Sinh,
    /// `sin(a)`
    Sin,
    /// `sqrt(a)`
    Sqrt,
    /// `a - b`
    Sub,
    /// `tanh(a)`
    Tanh,
    /// `tan(a)`
    Tan,
    /// `-a`
    UnMinus,
}

impl OpCode {
    /// Short lowercase name, also used by renderers for function calls
    pub fn name(self) -> &'static str {
        match self {
            OpCode::Abs => "abs",
            OpCode::Acos => "acos",
            OpCode::Add => "add",
            OpCode::AddSub => "addsub",
            OpCode::Alias => "alias",
            OpCode::Asin => "asin",
            OpCode::Atan => "atan",
            OpCode::ComLt => "lt",
            OpCode::ComLe => "le",
            OpCode::ComEq => "eq",
            OpCode::ComGe => "ge",
            OpCode::ComGt => "gt",
            OpCode::ComNe => "ne",
            OpCode::Cosh => "cosh",
            OpCode::Cos => "cos",
            OpCode::Div => "div",
            OpCode::Exp => "exp",
            OpCode::Inv => "independent",
            OpCode::Log => "log",
            OpCode::Mul => "mul",
            OpCode::MulDiv => "muldiv",
            OpCode::Pow => "pow",
            OpCode::Sign => "sign",
            OpCode::Sinh => "sinh",
            OpCode::Sin => "sin",
            OpCode::Sqrt => "sqrt",
            OpCode::Sub => "sub",
            OpCode::Tanh => "tanh",
            OpCode::Tan => "tan",
            OpCode::UnMinus => "neg",
        }
    }

    /// Flattened associative chain produced by the optimizer
    #[inline]
    pub fn is_chain(self) -> bool {
        matches!(self, OpCode::AddSub | OpCode::MulDiv)
    }

    /// Comparison-select with four arguments
    #[inline]
    pub fn is_comparison(self) -> bool {
        self.compare_op().is_some()
    }

    /// Elementary function of a single argument
    pub fn is_unary_function(self) -> bool {
        matches!(
            self,
            OpCode::Abs
                | OpCode::Acos
                | OpCode::Asin
                | OpCode::Atan
                | OpCode::Cosh
                | OpCode::Cos
                | OpCode::Exp
                | OpCode::Log
                | OpCode::Sign
                | OpCode::Sinh
                | OpCode::Sin
                | OpCode::Sqrt
                | OpCode::Tanh
                | OpCode::Tan
        )
    }

    /// The comparison performed by a comparison-select opcode
    pub fn compare_op(self) -> Option<CompareOp> {
        match self {
            OpCode::ComLt => Some(CompareOp::Lt),
            OpCode::ComLe => Some(CompareOp::Le),
            OpCode::ComEq => Some(CompareOp::Eq),
            OpCode::ComGe => Some(CompareOp::Ge),
            OpCode::ComGt => Some(CompareOp::Gt),
            OpCode::ComNe => Some(CompareOp::Ne),
            _ => None,
        }
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison used by conditional expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Lt,
    Le,
    Eq,
    Ge,
    Gt,
    Ne,
}

impl CompareOp {
    /// Evaluate the comparison on two concrete values
    #[inline]
    pub fn apply<B: PartialOrd>(self, left: B, right: B) -> bool {
        match self {
            CompareOp::Lt => left < right,
            CompareOp::Le => left <= right,
            CompareOp::Eq => left == right,
            CompareOp::Ge => left >= right,
            CompareOp::Gt => left > right,
            CompareOp::Ne => left != right,
        }
    }

    /// The comparison-select opcode for this comparison
    pub fn opcode(self) -> OpCode {
        match self {
            CompareOp::Lt => OpCode::ComLt,
            CompareOp::Le => OpCode::ComLe,
            CompareOp::Eq => OpCode::ComEq,
            CompareOp::Ge => OpCode::ComGe,
            CompareOp::Gt => OpCode::ComGt,
            CompareOp::Ne => OpCode::ComNe,
        }
    }

    /// C-like operator symbol
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Eq => "==",
            CompareOp::Ge => ">=",
            CompareOp::Gt => ">",
            CompareOp::Ne => "!=",
        }
    }
}

/// Per-argument operator tag of a flattened chain node.
///
/// The first argument of an add/sub chain is tagged `Add` and the first
/// argument of a mul/div chain is tagged `Mul`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ChainOp {
    /// Invert the tag: `+` <-> `-`, `*` <-> `/`
    #[inline]
    pub fn flip(self) -> Self {
        match self {
            ChainOp::Add => ChainOp::Sub,
            ChainOp::Sub => ChainOp::Add,
            ChainOp::Mul => ChainOp::Div,
            ChainOp::Div => ChainOp::Mul,
        }
    }

    /// Tag contributed by a binary opcode when it joins a chain
    pub fn from_binary(op: OpCode) -> Option<Self> {
        match op {
            OpCode::Add => Some(ChainOp::Add),
            OpCode::Sub => Some(ChainOp::Sub),
            OpCode::Mul => Some(ChainOp::Mul),
            OpCode::Div => Some(ChainOp::Div),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ChainOp::Add => "+",
            ChainOp::Sub => "-",
            ChainOp::Mul => "*",
            ChainOp::Div => "/",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chain_flip_is_involution() {
        for tag in [ChainOp::Add, ChainOp::Sub, ChainOp::Mul, ChainOp::Div] {
            assert_eq!(tag.flip().flip(), tag);
            assert_ne!(tag.flip(), tag);
        }
    }

    #[test]
    fn test_compare_roundtrip() {
        for cmp in [
            CompareOp::Lt,
            CompareOp::Le,
            CompareOp::Eq,
            CompareOp::Ge,
            CompareOp::Gt,
            CompareOp::Ne,
        ] {
            assert_eq!(cmp.opcode().compare_op(), Some(cmp));
            assert!(cmp.opcode().is_comparison());
        }
        assert!(CompareOp::Le.apply(1.0, 1.0));
        assert!(!CompareOp::Ne.apply(2.0, 2.0));
    }

    #[test]
    fn test_opcode_classes() {
        assert!(OpCode::AddSub.is_chain());
        assert!(!OpCode::Add.is_chain());
        assert!(OpCode::Sqrt.is_unary_function());
        assert!(!OpCode::UnMinus.is_unary_function());
        assert_eq!(ChainOp::from_binary(OpCode::Div), Some(ChainOp::Div));
        assert_eq!(ChainOp::from_binary(OpCode::Pow), None);
        assert_eq!(OpCode::Sin.to_string(), "sin");
    }
}
