//! In-process fakes for the external collaborators

use crate::core::error::{DeployError, DeployResult};
use crate::core::exec::{Tool, ToolOutput, Toolchain};
use crate::oracle::{Listing, ListingFetcher};
use crate::pipeline::Confirm;
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// One recorded tool invocation
#[derive(Debug, Clone)]
pub struct Call {
  pub args: Vec<String>,
  pub workdir: PathBuf,
}

impl Call {
  pub fn line(&self) -> String {
    self.args.join(" ")
  }
}

type SideEffect = Box<dyn Fn(&Path)>;

struct Rule {
  prefix: String,
  output: ToolOutput,
  effect: Option<SideEffect>,
}

/// Tool that answers from a script and records every call
///
/// Rules match on the space-joined argument line by prefix; the most recently
/// added matching rule wins. Unmatched calls succeed with empty output.
pub struct ScriptedTool {
  name: String,
  rules: RefCell<Vec<Rule>>,
  calls: RefCell<Vec<Call>>,
}

impl ScriptedTool {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      rules: RefCell::new(Vec::new()),
      calls: RefCell::new(Vec::new()),
    }
  }

  fn push(&self, prefix: &str, output: ToolOutput, effect: Option<SideEffect>) -> &Self {
    self.rules.borrow_mut().push(Rule {
      prefix: prefix.to_string(),
      output,
      effect,
    });
    self
  }

  pub fn respond(&self, prefix: &str, exit_code: i32, stdout: &str) -> &Self {
    self.push(
      prefix,
      ToolOutput {
        exit_code,
        stdout: stdout.as_bytes().to_vec(),
        stderr: Vec::new(),
      },
      None,
    )
  }

  pub fn respond_err(&self, prefix: &str, exit_code: i32, stderr: &str) -> &Self {
    self.push(
      prefix,
      ToolOutput {
        exit_code,
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
      },
      None,
    )
  }

  /// Succeed and run `effect` with the call's workdir (e.g. create build output)
  pub fn on(&self, prefix: &str, effect: impl Fn(&Path) + 'static) -> &Self {
    self.push(prefix, ToolOutput::default(), Some(Box::new(effect)))
  }

  pub fn calls(&self) -> Vec<Call> {
    self.calls.borrow().clone()
  }

  pub fn call_lines(&self) -> Vec<String> {
    self.calls.borrow().iter().map(Call::line).collect()
  }

  pub fn was_called(&self, prefix: &str) -> bool {
    self.calls.borrow().iter().any(|call| call.line().starts_with(prefix))
  }
}

impl Tool for ScriptedTool {
  fn name(&self) -> &str {
    &self.name
  }

  fn execute(&self, args: &[&str], workdir: &Path) -> DeployResult<ToolOutput> {
    let call = Call {
      args: args.iter().map(|a| a.to_string()).collect(),
      workdir: workdir.to_path_buf(),
    };
    let line = call.line();
    self.calls.borrow_mut().push(call);

    let rules = self.rules.borrow();
    let Some(rule) = rules.iter().rev().find(|rule| line.starts_with(&rule.prefix)) else {
      return Ok(ToolOutput::default());
    };
    if let Some(ref effect) = rule.effect {
      effect(workdir);
    }
    Ok(rule.output.clone())
  }
}

impl Tool for Rc<ScriptedTool> {
  fn name(&self) -> &str {
    self.as_ref().name()
  }

  fn execute(&self, args: &[&str], workdir: &Path) -> DeployResult<ToolOutput> {
    self.as_ref().execute(args, workdir)
  }
}

/// Handles to the scripted tools inside a [`Toolchain`]
pub struct ScriptedTools {
  pub python: Rc<ScriptedTool>,
  pub twine: Rc<ScriptedTool>,
  pub git: Rc<ScriptedTool>,
  pub makepkg: Rc<ScriptedTool>,
}

/// A toolchain of scripted tools, plus handles for scripting and inspection
pub fn scripted_toolchain() -> (Toolchain, ScriptedTools) {
  let tools = ScriptedTools {
    python: Rc::new(ScriptedTool::new("python3")),
    twine: Rc::new(ScriptedTool::new("twine")),
    git: Rc::new(ScriptedTool::new("git")),
    makepkg: Rc::new(ScriptedTool::new("makepkg")),
  };
  let toolchain = Toolchain {
    python: Box::new(tools.python.clone()),
    twine: Box::new(tools.twine.clone()),
    git: Box::new(tools.git.clone()),
    makepkg: Box::new(tools.makepkg.clone()),
  };
  (toolchain, tools)
}

/// Listing pages served from memory; unknown URLs are 404
#[derive(Default)]
pub struct FakeFetcher {
  pages: HashMap<String, Result<String, String>>,
  fetched: RefCell<Vec<String>>,
}

impl FakeFetcher {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn page(mut self, url: &str, body: &str) -> Self {
    self.pages.insert(url.to_string(), Ok(body.to_string()));
    self
  }

  pub fn fail(mut self, url: &str, reason: &str) -> Self {
    self.pages.insert(url.to_string(), Err(reason.to_string()));
    self
  }

  pub fn fetched(&self) -> Vec<String> {
    self.fetched.borrow().clone()
  }
}

impl ListingFetcher for FakeFetcher {
  fn fetch(&self, url: &str) -> DeployResult<Listing> {
    self.fetched.borrow_mut().push(url.to_string());
    match self.pages.get(url) {
      Some(Ok(body)) => Ok(Listing::Found(body.clone())),
      Some(Err(reason)) => Err(DeployError::message(reason.clone())),
      None => Ok(Listing::Missing { status: 404 }),
    }
  }
}

/// Confirmation answers given in order; once exhausted, the fallback answer
pub struct ScriptedConfirm {
  answers: RefCell<VecDeque<bool>>,
  fallback: bool,
  prompts: RefCell<Vec<String>>,
}

impl ScriptedConfirm {
  pub fn always(answer: bool) -> Self {
    Self::answers(&[], answer)
  }

  pub fn answers(answers: &[bool], fallback: bool) -> Self {
    Self {
      answers: RefCell::new(answers.iter().copied().collect()),
      fallback,
      prompts: RefCell::new(Vec::new()),
    }
  }

  pub fn prompts(&self) -> Vec<String> {
    self.prompts.borrow().clone()
  }
}

impl Confirm for ScriptedConfirm {
  fn confirm(&self, prompt: &str) -> bool {
    self.prompts.borrow_mut().push(prompt.to_string());
    self.answers.borrow_mut().pop_front().unwrap_or(self.fallback)
  }
}
