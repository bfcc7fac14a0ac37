//! Build script that tracks the embedded Diesel migrations.
//!
//! `embed_migrations!` reads the `migrations` directory at compile time, which
//! Cargo does not watch on its own. Emitting `rerun-if-changed` makes edits to
//! the contribution cache schema trigger a rebuild.

fn main() {
    println!("cargo:rerun-if-changed=migrations");
}
