use super::{
    OperandError, QuoteKind, RemoteShellError, SshCommand, operand_is_remote,
    parse_remote_shell, parse_ssh_operand,
};
use std::ffi::{OsStr, OsString};
use std::io::{Read, Write};

fn args_to_strings(args: &[OsString]) -> Vec<String> {
    args.iter()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn assembles_minimal_command() {
    let command = SshCommand::new("example.com");
    let (program, args) = command.command_parts_for_testing();

    assert_eq!(program, OsString::from("ssh"));
    assert_eq!(args_to_strings(&args), vec!["example.com".to_owned()]);
}

#[test]
fn assembles_scp_command_with_user_port_and_identity() {
    let mut command = SshCommand::new("files.example.com");
    command.set_user("backup");
    command.set_port(2222);
    command.set_batch_mode(true);
    command.set_identity("/home/backup/.ssh/id_ed25519");
    command.push_option("-oCompression=yes");
    command.set_remote_command(["scp -f -r -- '/srv/data'"]);

    let (_, args) = command.command_parts_for_testing();

    assert_eq!(
        args_to_strings(&args),
        vec![
            "-oBatchMode=yes".to_owned(),
            "-p".to_owned(),
            "2222".to_owned(),
            "-i".to_owned(),
            "/home/backup/.ssh/id_ed25519".to_owned(),
            "-oCompression=yes".to_owned(),
            "backup@files.example.com".to_owned(),
            "scp -f -r -- '/srv/data'".to_owned(),
        ]
    );
}

#[test]
fn wraps_ipv6_hosts_in_brackets() {
    let mut command = SshCommand::new("2001:db8::1");
    command.set_user("backup");

    let (_, args) = command.command_parts_for_testing();
    assert_eq!(args_to_strings(&args), vec!["backup@[2001:db8::1]".to_owned()]);
}

#[test]
fn empty_target_override_suppresses_target_argument() {
    let mut command = SshCommand::new("example.com");
    command.set_target_override(Some(OsString::new()));
    command.push_remote_arg("scp");

    let (_, args) = command.command_parts_for_testing();
    assert_eq!(args_to_strings(&args), vec!["scp".to_owned()]);
}

#[test]
fn configure_remote_shell_prepends_words_to_existing_options() {
    let mut command = SshCommand::new("example.com");
    command.push_option("-oForwardAgent=no");
    command
        .configure_remote_shell(OsStr::new("/usr/bin/ssh -F '/etc/my ssh'"))
        .expect("configure succeeds");

    let (program, args) = command.command_parts_for_testing();
    assert_eq!(program, OsString::from("/usr/bin/ssh"));
    assert_eq!(
        args_to_strings(&args),
        vec![
            "-F".to_owned(),
            "/etc/my ssh".to_owned(),
            "-oForwardAgent=no".to_owned(),
            "example.com".to_owned(),
        ]
    );
}

#[test]
fn parse_remote_shell_handles_quotes_and_escapes() {
    let args = parse_remote_shell(OsStr::new(r#"ssh  -o "User=a \"b\"" -o 'Option=' x\ y"#))
        .expect("parsing succeeds");
    assert_eq!(
        args_to_strings(&args),
        vec!["ssh", "-o", "User=a \"b\"", "-o", "Option=", "x y"]
    );
}

#[test]
fn parse_remote_shell_reports_errors() {
    assert_eq!(
        parse_remote_shell(OsStr::new("   ")),
        Err(RemoteShellError::Empty)
    );
    assert_eq!(
        parse_remote_shell(OsStr::new("ssh 'open")),
        Err(RemoteShellError::UnterminatedQuote(QuoteKind::Single))
    );
    assert_eq!(
        parse_remote_shell(OsStr::new("ssh \"open")),
        Err(RemoteShellError::UnterminatedQuote(QuoteKind::Double))
    );
    assert_eq!(
        parse_remote_shell(OsStr::new("ssh \\")),
        Err(RemoteShellError::TrailingEscape)
    );
}

#[test]
fn classifies_operands() {
    assert!(operand_is_remote("host:path"));
    assert!(operand_is_remote("user@host:"));
    assert!(operand_is_remote("[::1]:/tmp/x"));
    assert!(operand_is_remote("user@[fe80::1]:file"));
    assert!(!operand_is_remote("./host:path"));
    assert!(!operand_is_remote("/abs/path"));
    assert!(!operand_is_remote(":leading"));
    assert!(!operand_is_remote("relative/file.txt"));
}

#[cfg(windows)]
#[test]
fn drive_prefixes_stay_local_on_windows() {
    assert!(!operand_is_remote("C:\\Users\\me"));
    assert!(!operand_is_remote("d:/data"));
}

#[cfg(not(windows))]
#[test]
fn single_letter_hosts_are_remote() {
    assert!(operand_is_remote("C:\\Users\\me"));
    let operand = parse_ssh_operand("h:/x").expect("remote");
    assert_eq!(operand.host, "h");
    assert_eq!(operand.path, "/x");
}

#[test]
fn parses_user_host_and_path() {
    let operand = parse_ssh_operand("alice@example.org:docs/report.txt").expect("remote");
    assert_eq!(operand.user.as_deref(), Some("alice"));
    assert_eq!(operand.host, "example.org");
    assert_eq!(operand.path, "docs/report.txt");
    assert_eq!(operand.to_string(), "alice@example.org:docs/report.txt");
}

#[test]
fn empty_remote_path_means_home_directory() {
    let operand = parse_ssh_operand("example.org:").expect("remote");
    assert_eq!(operand.user, None);
    assert_eq!(operand.path, ".");
}

#[test]
fn strips_ipv6_brackets() {
    let operand = parse_ssh_operand("root@[2001:db8::7]:/etc/hosts").expect("remote");
    assert_eq!(operand.host, "2001:db8::7");
    assert_eq!(operand.path, "/etc/hosts");
    assert_eq!(operand.to_string(), "root@[2001:db8::7]:/etc/hosts");
}

#[test]
fn rejects_malformed_operands() {
    assert_eq!(
        parse_ssh_operand("local/file"),
        Err(OperandError::NotRemote("local/file".to_owned()))
    );
    assert!(matches!(
        parse_ssh_operand("@host:x"),
        Err(OperandError::EmptyUser(_))
    ));
    assert!(matches!(
        parse_ssh_operand("user@:x"),
        Err(OperandError::EmptyHost(_))
    ));
}

#[cfg(unix)]
fn spawn_shell(script: &str) -> super::SshConnection {
    let mut command = SshCommand::new("");
    command.set_program("sh");
    command.push_option("-c");
    command.push_option(script);

    command.spawn().expect("spawn local shell")
}

#[cfg(unix)]
#[test]
fn spawned_connection_forwards_io() {
    let mut connection = spawn_shell("cat");

    connection.write_all(b"abc").expect("write payload");
    connection.flush().expect("flush payload");

    let mut buffer = [0u8; 3];
    connection.read_exact(&mut buffer).expect("read echo");
    assert_eq!(&buffer, b"abc");

    let status = connection.wait().expect("wait for process");
    assert!(status.success());
}

#[cfg(unix)]
#[test]
fn split_halves_drive_the_process_independently() {
    let connection = spawn_shell("cat");
    let (mut reader, mut writer, child) = connection.split().expect("split");

    writer.write_all(b"ping").expect("write");
    writer.flush().expect("flush");
    let mut buffer = [0u8; 4];
    reader.read_exact(&mut buffer).expect("read");
    assert_eq!(&buffer, b"ping");

    drop(writer);
    let status = child.wait().expect("wait");
    assert!(status.success());
}

#[cfg(unix)]
#[test]
fn waiting_after_closing_stdin_reports_the_exit_status() {
    let mut connection = spawn_shell("cat >/dev/null; exit 3");
    connection.close_stdin().expect("close stdin");

    let status = connection.wait().expect("wait status");
    assert_eq!(status.code(), Some(3));
}

#[cfg(unix)]
#[test]
fn terminate_kills_a_running_process() {
    let connection = spawn_shell("sleep 30");
    let (_reader, _writer, child) = connection.split().expect("split");
    child.terminate().expect("terminate");
}

#[cfg(unix)]
#[test]
fn spawning_a_missing_program_fails() {
    let mut command = SshCommand::new("example.com");
    command.set_program("/nonexistent/oc-scp-test-ssh");
    assert!(command.spawn().is_err());
}
