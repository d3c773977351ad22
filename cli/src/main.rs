use clap::error::ErrorKind;
use clap::{Arg, ArgAction, Command};
use meow_interpreter::{LogSink, ModuleManager, Unwind};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
  let command = Command::new("meow")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Run a meow program")
    .arg(Arg::new("file").help("The script to run").required(true))
    .arg(
      Arg::new("include")
        .short('I')
        .long("include")
        .value_name("DIR")
        .help("Add a directory to the module search path")
        .action(ArgAction::Append),
    );

  let matches = match command.try_get_matches() {
    Ok(matches) => matches,
    Err(error) => {
      let displayed = matches!(
        error.kind(),
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
      );
      let _ = error.print();
      return if displayed {
        ExitCode::SUCCESS
      } else {
        // pre-load errors such as a missing file argument
        ExitCode::from(1)
      };
    }
  };

  let file = matches
    .get_one::<String>("file")
    .map(String::as_str)
    .unwrap_or_default();
  let include: Vec<PathBuf> = matches
    .get_many::<String>("include")
    .unwrap_or_default()
    .map(PathBuf::from)
    .collect();
  let argv: Vec<String> = std::env::args().collect();

  let manager = ModuleManager::new(meow_std::native_modules(), include, argv, LogSink::Stdout);

  match ModuleManager::load(&manager, "", file) {
    Ok(_) => ExitCode::SUCCESS,
    Err(unwind) => {
      report(unwind);
      ExitCode::from(70)
    }
  }
}

fn report(unwind: Unwind) {
  match unwind {
    Unwind::Failure(diagnostic) => eprintln!("{}", diagnostic.render()),
    Unwind::Exception(message) => eprintln!("Error: {message}"),
    Unwind::Thrown(value) => eprintln!("Uncaught exception: {value}"),
    Unwind::Return(_) | Unwind::Break | Unwind::Continue => {
      eprintln!("Error: a control-flow signal escaped the program");
    }
  }
}
