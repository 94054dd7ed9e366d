/*!
CLI subcommands. One file per subcommand, each exposing an `Args` struct
and an `execute_*` function that takes the session built in `main`.

  src/cmd/
    mod.rs      (this file)
    run.rs      (RunArgs   + execute_run)
    check.rs    (CheckArgs + execute_check)
    help.rs     (HelpArgs  + execute_help)
    list.rs     (ListArgs  + execute_list)
    shell.rs    (ShellArgs + execute_shell)
    builtin.rs  (built-in commands + manifest handler names)
    shared.rs   (Manifest, Session)
    format.rs   (human output helpers)
*/

pub mod builtin;
pub mod check;
pub mod format;
pub mod help;
pub mod list;
pub mod run;
pub mod shared;
pub mod shell;

pub use check::{CheckArgs, execute_check};
pub use help::{HelpArgs, execute_help};
pub use list::{ListArgs, execute_list};
pub use run::{RunArgs, execute_run};
pub use shared::Session;
pub use shell::{ShellArgs, execute_shell};
