/// The four statistics fetched in one run, assembled once and never mutated.
pub struct Stats {
    pub contributions: u64,
    pub commits: u64,
    pub stars: u64,
    pub merged_prs: u64,
}
