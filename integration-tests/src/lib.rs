//! End-to-end order filter scenarios live under `tests/`.
