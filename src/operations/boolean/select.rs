use super::bsp::BspClass;

/// The type of Boolean combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanKind {
    Union,
    Difference,
}

/// Classification of a region (an edge flank) against a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellClass {
    /// The region lies inside the shell's solid.
    Inside,
    /// The region lies outside the shell's solid.
    Outside,
    /// The region lies on a face of the shell whose normal agrees.
    CoincSame,
    /// The region lies on a face of the shell whose normal opposes.
    CoincOpp,
}

/// Decides whether a surface region survives in the Boolean output.
///
/// `op_a` is true when the region's face belongs to operand A; `shell`
/// is the region's classification against the opposite shell and `orig`
/// against the face's own original trim.
///
/// | kind       | op_a  | keep iff (orig inside AND ...)          |
/// |------------|-------|-----------------------------------------|
/// | Union      | true  | shell outside                           |
/// | Union      | false | shell outside OR coincident-same        |
/// | Difference | true  | shell outside                           |
/// | Difference | false | shell inside OR coincident-same         |
///
/// Coincident-opposite regions are always dropped (exactly one of the
/// two coincident faces survives, on the operand the table selects).
#[must_use]
pub fn keep_region(kind: BooleanKind, op_a: bool, shell: ShellClass, orig: ShellClass) -> bool {
    let in_shell = shell == ShellClass::Inside;
    let in_same = shell == ShellClass::CoincSame;
    let in_opp = shell == ShellClass::CoincOpp;
    let in_face = in_same || in_opp;

    if orig != ShellClass::Inside {
        return false;
    }
    match kind {
        BooleanKind::Union => {
            if op_a {
                !in_shell && !in_face
            } else {
                (!in_shell && !in_face) || in_same
            }
        }
        BooleanKind::Difference => {
            if op_a {
                !in_shell && !in_face
            } else {
                (in_shell && !in_face) || in_same
            }
        }
    }
}

/// Decides whether an edge survives: kept iff its inside region is kept
/// and its outside region is not. An edge with both flanks kept (or both
/// dropped) separates nothing and is discarded.
#[must_use]
pub fn keep_edge(
    kind: BooleanKind,
    op_a: bool,
    indir_shell: ShellClass,
    outdir_shell: ShellClass,
    indir_orig: ShellClass,
    outdir_orig: ShellClass,
) -> bool {
    let keep_in = keep_region(kind, op_a, indir_shell, indir_orig);
    let keep_out = keep_region(kind, op_a, outdir_shell, outdir_orig);
    keep_in && !keep_out
}

/// Maps a uv-BSP edge classification to the (inside-flank,
/// outside-flank) classes used by the keep policy.
#[must_use]
pub fn flanks_from_bsp_class(class: BspClass) -> (ShellClass, ShellClass) {
    match class {
        BspClass::Inside => (ShellClass::Inside, ShellClass::Inside),
        BspClass::Outside => (ShellClass::Outside, ShellClass::Outside),
        BspClass::EdgeParallel => (ShellClass::Inside, ShellClass::Outside),
        BspClass::EdgeAntiparallel => (ShellClass::Outside, ShellClass::Inside),
        BspClass::EdgeOther => {
            log::debug!("edge classified as crossing its own trim; treating as outside");
            (ShellClass::Outside, ShellClass::Outside)
        }
    }
}
