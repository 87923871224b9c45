//! Integration tests: run the compiled binary against throwaway git clones

mod helpers;
mod test_release;
