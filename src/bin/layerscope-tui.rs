use anyhow::Context;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use indextree::NodeId;
use layerscope::config::{Config, ResolvedConfig};
use layerscope::crawler::{FileCrawler, ScanStats};
use layerscope::error::ListenerError;
use layerscope::format::format_size;
use layerscope::keys::{generate_bindings, Action, Binding, BindingInfo, KeyPress};
use layerscope::layout::{CompoundLayout, Layout, LayoutEngine};
use layerscope::pane::{filetree, FileTreePane, FilterPane, InfoPane, InfoRow, Pane, PaneState, StatusPane};
use layerscope::surface::{Screen, Surface};
use layerscope::tree::{DiffType, FileTree, SortOrder};
use layerscope::Result;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::fs::File;
use std::io::{self, stdout};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, info_span, warn};
use tracing_subscriber::EnvFilter;

const LAYERS: &str = "layers";
const DETAILS: &str = "details";
const IMAGE: &str = "image";
const COLUMN: &str = "layer-details-column";

#[derive(Parser, Debug)]
#[command(name = "layerscope", version, about = "Browse a directory tree in the terminal")]
struct Args {
    /// Directory to scan
    #[arg(default_value = ".")]
    path: PathBuf,
    /// Earlier copy of the directory to diff against
    #[arg(long)]
    compare: Option<PathBuf>,
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Write logs here (the terminal belongs to the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Leave out dot files
    #[arg(long, default_value_t = false)]
    skip_hidden: bool,
}

enum AppEvent {
    ViewOptionChanged,
    Extract(PathBuf),
    Scanned(std::result::Result<ScanResult, String>),
}

struct ScanResult {
    tree: FileTree,
    stats: ScanStats,
}

struct App {
    screen: Screen,
    engine: LayoutEngine,
    column: CompoundLayout<InfoPane>,
    tree: FileTreePane,
    status: StatusPane,
    filter: FilterPane,
    global_help: Vec<Binding>,
    layer_ids: Vec<NodeId>,
    last_focus: Option<String>,
    events: Receiver<AppEvent>,
    extracted: Vec<PathBuf>,
    should_quit: bool,
}

impl App {
    fn new(config: &ResolvedConfig, root: &Path, size: (u16, u16)) -> Result<(Self, Sender<AppEvent>)> {
        let mut screen = Screen::new(size.0, size.1);
        let (tx, rx) = mpsc::channel::<AppEvent>();

        let global = &config.keybindings.global;
        let global_help = generate_bindings(
            &mut screen,
            None,
            &[
                BindingInfo::shown(&global.quit, Action::Quit, "Quit"),
                BindingInfo::shown(&global.toggle_view, Action::ToggleView, "Switch view"),
                BindingInfo::shown(&global.filter_files, Action::FilterFiles, "Filter"),
            ],
        )?;

        let panes = vec![
            InfoPane::new(LAYERS, "Layers", config, info_span!("ui", pane = LAYERS)).selectable(),
            InfoPane::new(DETAILS, "Layer Details", config, info_span!("ui", pane = DETAILS)),
            InfoPane::new(IMAGE, "Image Details", config, info_span!("ui", pane = IMAGE)),
        ];
        let column = CompoundLayout::new(COLUMN, panes, info_span!("ui", element = COLUMN));

        let mut tree = FileTreePane::new(
            FileTree::new(root),
            config,
            info_span!("ui", pane = filetree::NAME),
        )?;
        tree.set_title(format!("Scanning {} ...", root.display()));

        let view_tx = tx.clone();
        tree.listeners_mut().view_option.subscribe(move |_| {
            view_tx
                .send(AppEvent::ViewOptionChanged)
                .map_err(|e| ListenerError::new(e.to_string()))
        });
        let extract_tx = tx.clone();
        tree.listeners_mut().extract.subscribe(move |event| {
            extract_tx
                .send(AppEvent::Extract(event.path.clone()))
                .map_err(|e| ListenerError::new(e.to_string()))
        });

        let app = Self {
            screen,
            engine: LayoutEngine::new(config, info_span!("ui", element = "engine")),
            column,
            tree,
            status: StatusPane::new(info_span!("ui", pane = "status")),
            filter: FilterPane::new(info_span!("ui", pane = "filter")),
            global_help,
            layer_ids: Vec::new(),
            last_focus: None,
            events: rx,
            extracted: Vec::new(),
            should_quit: false,
        };
        Ok((app, tx))
    }

    fn layout(&mut self) -> Result<()> {
        let mut columns: [&mut dyn Layout; 2] = [&mut self.column, &mut self.tree];
        let mut footers: [&mut dyn Layout; 2] = [&mut self.status, &mut self.filter];
        self.engine
            .layout(&mut self.screen, &mut columns, &mut footers)?;

        let focus = self.screen.current_focus().map(str::to_string);
        if focus != self.last_focus {
            self.last_focus = focus;
            self.refresh_status()?;
        }
        self.screen.flush()
    }

    fn poll_events(&mut self) -> Result<()> {
        while let Ok(event) = self.events.try_recv() {
            match event {
                AppEvent::ViewOptionChanged => self.refresh_status()?,
                AppEvent::Extract(path) => {
                    info!(path = %path.display(), "marked for extraction");
                    self.status
                        .set_message(Some(format!("Extract: {}", path.display())));
                    self.status.render(&mut self.screen)?;
                    self.extracted.push(path);
                }
                AppEvent::Scanned(Ok(result)) => self.load_tree(result)?,
                AppEvent::Scanned(Err(err)) => {
                    warn!(error = %err, "scan failed");
                    self.tree.set_title("Scan failed");
                    self.status.set_message(Some(format!("Scan failed: {err}")));
                    self.render_tree()?;
                    self.status.render(&mut self.screen)?;
                }
            }
        }
        Ok(())
    }

    fn load_tree(&mut self, result: ScanResult) -> Result<()> {
        let ScanResult { tree, stats } = result;
        let root = tree.root_path().to_path_buf();
        let (files, dirs) = tree.counts();

        self.layer_ids = tree.sorted_children(tree.get_root(), SortOrder::ByName);
        let layers = self
            .layer_ids
            .iter()
            .filter_map(|&id| tree.node(id))
            .map(|node| {
                let mut detail = format_size(node.cumulative_size);
                if node.diff != DiffType::Unmodified {
                    detail = format!("{detail} {}", node.diff.label());
                }
                let label = if node.is_dir {
                    format!("{}/", node.name)
                } else {
                    node.name.clone()
                };
                InfoRow::new(label, detail)
            })
            .collect();

        let mut image = vec![
            InfoRow::new("Root", root.display().to_string()),
            InfoRow::new("Total size", format_size(tree.total_size())),
            InfoRow::new("Files", files.to_string()),
            InfoRow::new("Directories", dirs.to_string()),
            InfoRow::new("Scan time", format!("{} ms", stats.duration_ms)),
        ];
        if stats.skipped > 0 {
            image.push(InfoRow::new("Unreadable", stats.skipped.to_string()));
        }
        for diff in DiffType::ALL {
            let count = tree.diff_count(tree.get_root(), diff);
            image.push(InfoRow::new(diff.label(), count.to_string()));
        }

        self.tree.set_title(format!("Current Tree Contents: {}", root.display()));
        self.tree.set_tree(&mut self.screen, tree)?;
        if let Some(pane) = self.column.pane_mut(LAYERS) {
            pane.set_rows(layers);
        }
        if let Some(pane) = self.column.pane_mut(IMAGE) {
            pane.set_rows(image);
        }
        self.refresh_details()?;
        self.render_column()?;
        self.status.set_message(None);
        self.refresh_status()
    }

    /// Describe the top-level entry selected in the layers pane.
    fn refresh_details(&mut self) -> Result<()> {
        let selected = self
            .column
            .pane(LAYERS)
            .and_then(InfoPane::cursor)
            .and_then(|index| self.layer_ids.get(index).copied());

        let tree = self.tree.view_model().tree();
        let rows = match selected.and_then(|id| tree.node(id).map(|node| (id, node))) {
            Some((id, node)) => {
                let mut rows = vec![
                    InfoRow::new("Path", node.path.display().to_string()),
                    InfoRow::new("Size", format_size(node.cumulative_size)),
                ];
                for diff in DiffType::ALL {
                    rows.push(InfoRow::new(diff.label(), tree.diff_count(id, diff).to_string()));
                }
                rows
            }
            None => Vec::new(),
        };

        if let Some(pane) = self.column.pane_mut(DETAILS) {
            pane.set_rows(rows);
            if pane.state() == PaneState::Ready {
                pane.render(&mut self.screen)?;
            }
        }
        Ok(())
    }

    fn render_tree(&mut self) -> Result<()> {
        if self.tree.state() == PaneState::Ready {
            self.tree.render(&mut self.screen)?;
        }
        Ok(())
    }

    fn render_column(&mut self) -> Result<()> {
        for pane in self.column.panes() {
            if pane.state() == PaneState::Ready {
                pane.render(&mut self.screen)?;
            }
        }
        Ok(())
    }

    fn refresh_status(&mut self) -> Result<()> {
        let mut help: String = self
            .global_help
            .iter()
            .map(|binding| binding.render_key_help(None))
            .collect();
        match self.screen.current_focus() {
            Some(filetree::NAME) => help.push_str(&self.tree.key_help()),
            Some(name) => {
                if let Some(pane) = self.column.pane(name) {
                    help.push_str(&pane.key_help());
                }
            }
            None => {}
        }
        self.status.set_help(help);
        self.status.render(&mut self.screen)
    }

    fn on_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.filter.is_editing() {
            return self.on_filter_key(key);
        }

        let Some(action) = self.screen.binding_for(KeyPress::from_event(key)) else {
            return Ok(());
        };
        if self.status.message().is_some() {
            self.status.set_message(None);
            self.status.render(&mut self.screen)?;
        }

        let result = match action {
            Action::Quit => {
                self.should_quit = true;
                Ok(())
            }
            Action::ToggleView => self.toggle_view(),
            Action::FilterFiles => {
                self.filter.begin_edit();
                self.filter.render(&mut self.screen)
            }
            other => self.dispatch(other),
        };

        // failed actions are reported, not fatal
        if let Err(err) = result {
            let message = describe(err);
            warn!(error = %message, ?action, "action failed");
            self.status.set_message(Some(message));
            self.status.render(&mut self.screen)?;
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) -> Result<()> {
        let focus = self.screen.current_focus().map(str::to_string);
        match focus.as_deref() {
            Some(filetree::NAME) => self.tree.handle(&mut self.screen, action),
            Some(name) => {
                if let Some(pane) = self.column.pane_mut(name) {
                    pane.handle(&mut self.screen, action)?;
                }
                if name == LAYERS {
                    self.refresh_details()?;
                }
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn toggle_view(&mut self) -> Result<()> {
        let next = match self.screen.current_focus() {
            Some(filetree::NAME) => LAYERS,
            _ => filetree::NAME,
        };
        if self.screen.region(next).is_none() {
            return Ok(());
        }
        self.screen.set_focus(next)?;
        self.last_focus = Some(next.to_string());

        self.render_tree()?;
        self.render_column()?;
        self.refresh_status()
    }

    fn on_filter_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
                return Ok(());
            }
            KeyCode::Enter | KeyCode::Esc => {
                return self.filter.end_edit(&mut self.screen);
            }
            KeyCode::Backspace => self.filter.pop(),
            KeyCode::Char(ch) => self.filter.push(ch),
            _ => return Ok(()),
        }
        self.apply_filter()
    }

    /// Compile the filter; an invalid pattern keeps the previous one.
    fn apply_filter(&mut self) -> Result<()> {
        match self.filter.pattern() {
            Ok(pattern) => {
                self.tree.set_filter(pattern);
                self.status.set_message(None);
                if self.tree.state() == PaneState::Ready {
                    self.tree.update()?;
                    self.tree.render(&mut self.screen)?;
                }
            }
            Err(err) => self.status.set_message(Some(describe(err))),
        }
        self.filter.render(&mut self.screen)?;
        self.status.render(&mut self.screen)
    }
}

fn start_scan(tx: Sender<AppEvent>, root: PathBuf, compare: Option<PathBuf>, skip_hidden: bool) {
    thread::spawn(move || {
        let crawler = FileCrawler::new().skip_hidden(skip_hidden);
        let result = crawler.scan(&root).and_then(|(mut tree, stats)| {
            if let Some(base) = compare {
                let (base, _) = crawler.scan(&base)?;
                tree.compare(&base);
            }
            Ok(ScanResult { tree, stats })
        });
        if tx.send(AppEvent::Scanned(result.map_err(describe))).is_err() {
            debug!("scan finished after the UI exited");
        }
    });
}

/// One line with the whole cause chain.
fn describe(err: layerscope::Error) -> String {
    format!("{:#}", anyhow::Error::new(err))
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("LAYERSCOPE_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("unable to create log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))
                .context("unable to initialise logging")?;
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::sink)
                .try_init()
                .map_err(|e| anyhow::anyhow!(e))
                .context("unable to initialise logging")?;
        }
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> anyhow::Result<()> {
    loop {
        app.poll_events()?;
        app.layout()?;
        terminal.draw(|frame| app.screen.draw(frame))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(50))? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => app.on_key(key)?,
                Event::Resize(width, height) => app.screen.resize(width, height),
                _ => {}
            }
        }
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let config = Config::load_or_default(args.config.as_deref())
        .context("unable to load configuration")?
        .resolve();
    if !args.path.is_dir() {
        anyhow::bail!("not a directory: {}", args.path.display());
    }
    info!(path = %args.path.display(), "starting");

    let size = crossterm::terminal::size()?;
    let (mut app, tx) = App::new(&config, &args.path, size)?;
    start_scan(tx, args.path.clone(), args.compare.clone(), args.skip_hidden);

    enable_raw_mode()?;
    crossterm::execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let app_result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    for path in &app.extracted {
        println!("{}", path.display());
    }
    app_result
}
