//! Shared construction of request objects.

use std::rc::Rc;

use log::debug;

use super::FakeXhr;
use crate::config::XhrConfig;
use crate::document::{DocumentParser, XmlParser};
use crate::error_handling::ConfigValidationError;
use crate::transport::Transport;

/// Builds [`FakeXhr`] instances that share a configuration, transport and
/// document parser.
///
/// # Examples
///
/// ```
/// use fake_xhr::{FakeXhr, XhrConfig, XhrFactory};
///
/// let factory = XhrFactory::new(XhrConfig { chunk_size: 4, ..Default::default() })?
///     .with_transport(|xhr: &FakeXhr| -> anyhow::Result<()> {
///         xhr.respond(204, [("X-Mock", "yes")], "")?;
///         Ok(())
///     });
///
/// let xhr = factory.create();
/// xhr.open("DELETE", "/items/1");
/// xhr.send(None)?;
/// assert_eq!(xhr.status(), 204);
/// assert_eq!(xhr.chunk_size(), 4);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Clone)]
pub struct XhrFactory {
    config: XhrConfig,
    transport: Option<Rc<dyn Transport>>,
    parser: Rc<dyn DocumentParser>,
}

impl XhrFactory {
    /// Creates a factory after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns the first invalid field of `config`.
    pub fn new(config: XhrConfig) -> Result<Self, ConfigValidationError> {
        config.validate()?;
        Ok(Self {
            config,
            transport: None,
            parser: Rc::new(XmlParser),
        })
    }

    /// Routes every created instance's `send` to `transport`.
    pub fn with_transport<T>(mut self, transport: T) -> Self
    where
        T: Transport + 'static,
    {
        self.transport = Some(Rc::new(transport));
        self
    }

    /// Replaces the parser used for XML-family responses.
    pub fn with_parser<P>(mut self, parser: P) -> Self
    where
        P: DocumentParser + 'static,
    {
        self.parser = Rc::new(parser);
        self
    }

    /// The validated configuration.
    pub fn config(&self) -> &XhrConfig {
        &self.config
    }

    /// Creates a fresh `UNSENT` instance.
    pub fn create(&self) -> FakeXhr {
        debug!(
            "Creating request object (chunk size: {}, async: {}, XML: {})",
            self.config.chunk_size, self.config.default_async, self.config.parse_xml
        );
        FakeXhr::from_parts(
            self.config.clone(),
            self.transport.clone(),
            Rc::clone(&self.parser),
        )
    }
}

impl Default for XhrFactory {
    fn default() -> Self {
        Self {
            config: XhrConfig::default(),
            transport: None,
            parser: Rc::new(XmlParser),
        }
    }
}
