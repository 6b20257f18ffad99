//! Behavioural tests for the queue worker.
//!
//! - `harness.rs`     - Scripted stub sender, post builder, idle wait
//! - `ordering.rs`    - FIFO delivery, in-place retries, mid-drain appends
//! - `retry.rs`       - Rate-limit delays, transient retry budget
//! - `isolation.rs`   - Per-item failure containment and item spacing
//! - `concurrency.rs` - Single drain loop, prompt enqueue, idle/running cycle
