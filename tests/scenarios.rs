use mailprompt::{Config, Error};
use smtp::{
    testing::{Policy, TestRelay},
    ErrorKind, SmtpDispatcher,
};

fn config(skip: Option<&str>) -> Config {
    Config::from_lookup(|name| {
        if Some(name) == skip {
            return None;
        }

        match name {
            "SMTP_USERNAME" => Some("u".to_owned()),
            "SMTP_PASSWORD" => Some("p".to_owned()),
            "SENDER_EMAIL" => Some("a@x.com".to_owned()),
            "RECEIVER_EMAIL" => Some("b@x.com".to_owned()),
            _ => None,
        }
    })
}

#[tokio::test]
async fn relay_accepts() -> anyhow::Result<()> {
    let relay = TestRelay::bind(Policy::new("u", "p")).await?;
    let dispatcher = SmtpDispatcher::new(relay.relay()?);
    let server = tokio::spawn(relay.serve_one());

    let mut output = Vec::new();
    let receipt = mailprompt::run(
        &config(None),
        "Hello\r\nWorld\r\n".as_bytes(),
        &mut output,
        &dispatcher,
    )
    .await?;
    let transcript = server.await??;

    let output = String::from_utf8(output)?;
    assert!(output.starts_with(
        "Enter the subject of the mail: Enter the text of the mail: Message sent: <"
    ));
    assert!(output.ends_with(&format!("Message sent: {}\n", receipt.message_id)));

    assert_eq!(transcript.messages.len(), 1);
    let received = &transcript.messages[0];
    assert_eq!(received.from.to_string(), "a@x.com");
    let recipients: Vec<_> = received.recipients.iter().map(ToString::to_string).collect();
    assert_eq!(recipients, ["b@x.com"]);
    assert!(received.data.contains("Subject: Hello\r\n"));
    assert!(received.data.contains("From: Ritik <a@x.com>"));
    assert!(received.data.trim_end().ends_with("World"));

    Ok(())
}

#[tokio::test]
async fn relay_rejects_credentials() -> anyhow::Result<()> {
    let relay = TestRelay::bind(Policy::new("u", "not p")).await?;
    let dispatcher = SmtpDispatcher::new(relay.relay()?);
    let server = tokio::spawn(relay.serve_one());

    let mut output = Vec::new();
    let error = mailprompt::run(
        &config(None),
        "Hello\nWorld\n".as_bytes(),
        &mut output,
        &dispatcher,
    )
    .await
    .unwrap_err();
    let transcript = server.await??;

    assert!(matches!(error, Error::Dispatch(_)));
    assert_eq!(error.kind(), Some(ErrorKind::Authentication));
    assert!(!String::from_utf8(output)?.contains("Message sent"));
    assert!(transcript.messages.is_empty());

    Ok(())
}

#[tokio::test]
async fn sender_unset() -> anyhow::Result<()> {
    // nothing listens here: the run has to stop before connecting
    let relay = TestRelay::bind(Policy::new("u", "p")).await?;
    let dispatcher = SmtpDispatcher::new(relay.relay()?);
    drop(relay);

    let mut output = Vec::new();
    let error = mailprompt::run(
        &config(Some("SENDER_EMAIL")),
        "Hello\nWorld\n".as_bytes(),
        &mut output,
        &dispatcher,
    )
    .await
    .unwrap_err();

    assert!(matches!(error, Error::Config(_)));
    assert_eq!(error.kind(), Some(ErrorKind::Configuration));
    assert_eq!(
        error.to_string(),
        "environment variable SENDER_EMAIL is not set"
    );
    assert!(!String::from_utf8(output)?.contains("Message sent"));

    Ok(())
}

#[tokio::test]
async fn malformed_sender() -> anyhow::Result<()> {
    let relay = TestRelay::bind(Policy::new("u", "p")).await?;
    let dispatcher = SmtpDispatcher::new(relay.relay()?);
    drop(relay);

    let config = Config {
        sender: Some("not an address".to_owned()),
        ..config(None)
    };

    let error = mailprompt::run(&config, "Hello\nWorld\n".as_bytes(), Vec::new(), &dispatcher)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        Error::Dispatch(smtp::Error::Address { role: "sender", .. })
    ));
    assert_eq!(error.kind(), Some(ErrorKind::Configuration));

    Ok(())
}
