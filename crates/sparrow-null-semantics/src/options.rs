/// Options controlling how comparisons with `NULL` are handled.
#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
#[command(rename_all = "kebab-case")]
pub struct NullSemanticsOptions {
    /// Keep the relational (three-valued) semantics of comparisons.
    ///
    /// The null-semantics rewrite is skipped, and negated comparisons are not
    /// replaced by their complement during simplification, since that is only
    /// valid once comparisons are two-valued.
    #[arg(long, action)]
    pub use_relational_nulls: bool,

    /// Skip algebraic simplification after the rewrite.
    #[arg(long, action)]
    pub skip_simplification: bool,
}

pub const DEFAULT_NULL_SEMANTICS_OPTIONS: NullSemanticsOptions = NullSemanticsOptions {
    use_relational_nulls: false,
    skip_simplification: false,
};

impl Default for NullSemanticsOptions {
    fn default() -> Self {
        DEFAULT_NULL_SEMANTICS_OPTIONS.clone()
    }
}
