#[derive(derive_more::Display, Debug)]
pub enum Error {
    #[display(
        fmt = "join predicate must be an equality or a conjunction of equalities, but was '{_0}'"
    )]
    InvalidJoinPredicate(String),
    #[display(fmt = "failed to rewrite null semantics")]
    Rewrite,
    #[display(fmt = "failed to simplify expression")]
    Simplify,
}

impl error_stack::Context for Error {}
