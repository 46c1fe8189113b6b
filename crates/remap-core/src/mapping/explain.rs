//! Deterministic, read-only rendering of a compiled op program.

use crate::mapping::{Mapping, Op};

impl Mapping {
    /// One line per op, indented by cursor depth. Element mappings are
    /// rendered inline below their `enumerate` line.
    #[must_use]
    pub fn explain(&self) -> Vec<String> {
        let mut lines = Vec::new();
        explain_into(self, 0, &mut lines);

        lines
    }
}

fn explain_into(mapping: &Mapping, mut depth: usize, lines: &mut Vec<String>) {
    for op in mapping.ops() {
        if matches!(op, Op::LeaveSource | Op::LeaveTarget) {
            depth = depth.saturating_sub(1);
        }

        let pad = "  ".repeat(depth);
        match op {
            Op::EnterSource { field, skip_to } => {
                lines.push(format!(
                    "{pad}enter source {} (null: skip to {skip_to})",
                    field.name()
                ));
                depth += 1;
            }
            Op::EnterTarget { field } => {
                lines.push(format!("{pad}enter target {}", field.name()));
                depth += 1;
            }
            Op::LeaveSource => lines.push(format!("{pad}leave source")),
            Op::LeaveTarget => lines.push(format!("{pad}leave target")),
            Op::Copy {
                source,
                target,
                transform,
            } => lines.push(format!(
                "{pad}copy {} -> {} ({})",
                source.name(),
                target.name(),
                transform.describe()
            )),
            Op::ReadPath {
                path,
                target,
                transform,
            } => lines.push(format!(
                "{pad}read {} -> {} ({})",
                path.path(),
                target.name(),
                transform.describe()
            )),
            Op::Enumerate {
                source,
                target,
                element,
            } => {
                lines.push(format!(
                    "{pad}enumerate {} -> {} as {} -> {}",
                    source.as_ref().map_or("<current>", |field| field.name()),
                    target.as_ref().map_or("<current>", |field| field.name()),
                    element.source().name(),
                    element.target().name()
                ));
                explain_into(element, depth + 1, lines);
            }
        }
    }
}
