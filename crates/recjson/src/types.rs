/// The declared type of a record field, as data.
///
/// Declared types are what field authors write down; the shape walker in
/// `shape` classifies them into the closed set of codec shapes. `Named`
/// references a nested record or enumeration by its registered name and is
/// resolved when the owning record's routine is compiled, so forward
/// references are fine as long as the target is registered before first use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Text,
    Int,
    Float,
    Bool,
    Decimal,
    Uuid,
    Date,
    DateTime,
    /// One layer of optionality. Only the outermost layer participates in
    /// absent-vs-null field handling; deeper layers are ordinary null guards.
    Option(Box<TypeExpr>),
    List(Box<TypeExpr>),
    /// Fixed-arity heterogeneous tuple.
    Tuple(Vec<TypeExpr>),
    /// Variable-length homogeneous tuple. Same element-wise semantics as
    /// `List`, but the decoded container keeps tuple identity.
    TupleOf(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// A nested record or enumeration, by registered name.
    Named(String),
    /// No usable annotation; the field is passed through untouched.
    Any,
}

impl TypeExpr {
    pub fn option(inner: TypeExpr) -> Self {
        TypeExpr::Option(Box::new(inner))
    }

    pub fn list(inner: TypeExpr) -> Self {
        TypeExpr::List(Box::new(inner))
    }

    pub fn tuple_of(inner: TypeExpr) -> Self {
        TypeExpr::TupleOf(Box::new(inner))
    }

    pub fn map(key: TypeExpr, value: TypeExpr) -> Self {
        TypeExpr::Map(Box::new(key), Box::new(value))
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }
}
