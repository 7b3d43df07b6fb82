//! Property-based tests for requirement manifest rewriting.
//!
//! These tests use proptest to generate random manifests and references and
//! verify that the rewrite invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::defaults::CANONICAL_REPO;
    use crate::manifest::ManifestRewriter;
    use crate::reference::DependencyRef;
    use proptest::prelude::*;

    fn reference() -> impl Strategy<Value = DependencyRef> {
        ("[a-z][a-z0-9-]{0,10}", "[a-z][a-z0-9_-]{0,10}", "[0-9a-f]{7,40}").prop_map(
            |(owner, name, sha)| {
                DependencyRef::parse(&format!("{}/{}.git@{}", owner, name, sha)).unwrap()
            },
        )
    }

    fn rewriter(dependency_ref: &DependencyRef) -> ManifestRewriter {
        ManifestRewriter::new(CANONICAL_REPO, dependency_ref).unwrap()
    }

    proptest! {
        /// Property: rewriting twice with the same reference gives the same bytes
        #[test]
        fn rewrite_is_idempotent(
            dependency_ref in reference(),
            sha in "[0-9a-zA-Z.]{1,40}",
            suffix in "egg=[a-z_-]{1,12}",
            before in "[a-z=0-9.\n]{0,40}",
        ) {
            let input = format!(
                "{}\ngit+https://github.com/{}.git@{}#{}\n",
                before, CANONICAL_REPO, sha, suffix
            );
            let r = rewriter(&dependency_ref);
            let once = r.rewrite_str(&input).into_owned();
            let twice = r.rewrite_str(&once).into_owned();
            prop_assert_eq!(once, twice);
        }

        /// Property: the `#` suffix survives the rewrite unchanged
        #[test]
        fn rewrite_preserves_suffix(
            dependency_ref in reference(),
            sha in "[0-9a-f]{7,40}",
            suffix in "egg=[a-z_-]{1,12}(\\[[a-z]{1,5}\\])?",
        ) {
            let input = format!("{}.git@{}#{}", CANONICAL_REPO, sha, suffix);
            let rewritten = rewriter(&dependency_ref).rewrite_str(&input).into_owned();
            prop_assert_eq!(rewritten, format!("{}#{}", dependency_ref, suffix));
        }

        /// Property: content without the canonical marker is returned unchanged
        #[test]
        fn rewrite_ignores_unrelated_content(
            dependency_ref in reference(),
            content in "[a-zA-Z0-9=<>.#/@ \n-]{0,200}",
        ) {
            prop_assume!(!content.contains(CANONICAL_REPO));
            let rewritten = rewriter(&dependency_ref).rewrite_str(&content).into_owned();
            prop_assert_eq!(rewritten, content);
        }

        /// Property: line count never changes
        #[test]
        fn rewrite_preserves_line_count(
            dependency_ref in reference(),
            lines in prop::collection::vec("[a-z0-9=.]{0,20}", 0..10),
        ) {
            let mut content = lines.join("\n");
            content.push_str(&format!("\n{}.git@abc#egg=f5-cccl\n", CANONICAL_REPO));
            let rewritten = rewriter(&dependency_ref).rewrite_str(&content).into_owned();
            prop_assert_eq!(rewritten.lines().count(), content.lines().count());
        }
    }
}
