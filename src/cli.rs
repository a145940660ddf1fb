// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .conflicts_with("jsonl")
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn account_arg() -> Arg {
    Arg::new("account")
        .long("account")
        .required(true)
        .help("Account reference KIND:ID, e.g. bank:main")
}

fn movement_args(cmd: Command, from: bool, to: bool) -> Command {
    let mut cmd = cmd;
    if from {
        cmd = cmd.arg(
            Arg::new("from")
                .long("from")
                .required(true)
                .help("Source account KIND:ID"),
        );
    }
    if to {
        cmd = cmd.arg(
            Arg::new("to")
                .long("to")
                .required(true)
                .help("Destination account KIND:ID"),
        );
    }
    cmd.arg(Arg::new("amount").long("amount").required(true))
        .arg(
            Arg::new("fee-fixed")
                .long("fee-fixed")
                .conflicts_with("fee-percent")
                .help("Flat fee charged to the source"),
        )
        .arg(
            Arg::new("fee-percent")
                .long("fee-percent")
                .help("Fee as a percent of the amount, e.g. 2.5"),
        )
        .arg(
            Arg::new("commission")
                .long("commission")
                .help("Extra value credited to the destination"),
        )
        .arg(Arg::new("description").long("description").short('d'))
        .arg(
            Arg::new("date")
                .long("date")
                .help("YYYY-MM-DD or RFC 3339 timestamp (default: now)"),
        )
        .arg(
            Arg::new("count-destination-limits")
                .long("count-destination-limits")
                .action(ArgAction::SetTrue)
                .conflicts_with("skip-destination-limits"),
        )
        .arg(
            Arg::new("skip-destination-limits")
                .long("skip-destination-limits")
                .action(ArgAction::SetTrue),
        )
}

pub fn build_cli() -> Command {
    Command::new("moneyrail")
        .version(clap::crate_version!())
        .about("Move money between bank, vault, e-wallet, prepaid and credit card accounts")
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("account")
                .about("Manage accounts")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("kind")
                                .long("kind")
                                .required(true)
                                .help("bank|vault|ewallet|prepaid|credit"),
                        )
                        .arg(Arg::new("id").long("id").required(true))
                        .arg(Arg::new("name").long("name").required(true))
                        .arg(Arg::new("balance").long("balance"))
                        .arg(Arg::new("credit-limit").long("credit-limit"))
                        .arg(Arg::new("owed").long("owed"))
                        .arg(Arg::new("daily-limit").long("daily-limit"))
                        .arg(Arg::new("monthly-limit").long("monthly-limit"))
                        .arg(Arg::new("tx-limit").long("tx-limit"))
                        .arg(Arg::new("max-capacity").long("max-capacity"))
                        .arg(Arg::new("min-balance").long("min-balance"))
                        .arg(
                            Arg::new("daily-withdrawal-limit").long("daily-withdrawal-limit"),
                        ),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(Command::new("rm").arg(account_arg()))
                .subcommand(Command::new("balance").arg(account_arg()))
                .subcommand(Command::new("activate").arg(account_arg()))
                .subcommand(Command::new("deactivate").arg(account_arg()))
                .subcommand(
                    Command::new("reset-usage")
                        .about("Reset usage counters (daily and/or monthly)")
                        .arg(Arg::new("daily").long("daily").action(ArgAction::SetTrue))
                        .arg(
                            Arg::new("monthly")
                                .long("monthly")
                                .action(ArgAction::SetTrue),
                        ),
                ),
        )
        .subcommand(
            Command::new("move")
                .about("Submit a movement")
                .subcommand(movement_args(
                    Command::new("deposit").about("Credit an account from outside"),
                    false,
                    true,
                ))
                .subcommand(movement_args(
                    Command::new("withdraw").about("Debit an account to outside"),
                    true,
                    false,
                ))
                .subcommand(movement_args(
                    Command::new("transfer").about("Move money between two accounts"),
                    true,
                    true,
                ))
                .subcommand(movement_args(
                    Command::new("pay").about("Pay down a credit card"),
                    true,
                    true,
                )),
        )
        .subcommand(
            Command::new("ledger").subcommand(json_flags(
                Command::new("list")
                    .arg(Arg::new("account").long("account"))
                    .arg(Arg::new("kind").long("kind"))
                    .arg(Arg::new("from").long("from"))
                    .arg(Arg::new("until").long("until"))
                    .arg(
                        Arg::new("limit")
                            .long("limit")
                            .value_parser(value_parser!(usize)),
                    ),
            )),
        )
        .subcommand(
            Command::new("import").subcommand(
                json_flags(Command::new("movements"))
                    .arg(Arg::new("path").long("path").required(true)),
            ),
        )
        .subcommand(
            Command::new("config")
                .about("Engine settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(Command::new("list")),
        )
        .subcommand(Command::new("doctor").about("Check stored state against invariants"))
}
