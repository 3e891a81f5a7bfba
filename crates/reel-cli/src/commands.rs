use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context};
use colored::Colorize;
use serde_json::json;

use reel_disk::{PayloadDir, PayloadSweeper, StoreConfig, StoreDirectory};
use reel_tree::{codec, ChangeEvent, ChangeKind, EventLog, Item, NodeRef, PayloadResolver, TreeStore};
use reel_types::ItemId;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let (dir, format) = (cli.dir, cli.format);
    let open = || Session::open(&dir, format);
    match cli.command {
        Command::Init(args) => cmd_init(&dir, args),
        Command::Tree(args) => open()?.cmd_tree(args),
        Command::Mkdir(args) => open()?.cmd_mkdir(args),
        Command::Add(args) => open()?.cmd_add(args),
        Command::Rename(args) => open()?.cmd_rename(args),
        Command::Mv(args) => open()?.cmd_mv(args),
        Command::Rm(args) => open()?.cmd_rm(args),
        Command::Path(args) => open()?.cmd_path(args),
        Command::Locate(args) => open()?.cmd_locate(args),
        Command::Show(args) => open()?.cmd_show(args),
    }
}

fn cmd_init(dir: &Path, args: InitArgs) -> anyhow::Result<()> {
    let mut config = StoreConfig::load(dir)?;
    if StoreDirectory::new(dir, config.clone()).exists() {
        bail!("a store already exists in {}", dir.display());
    }
    if let Some(name) = args.root_name {
        config.root_name = name;
        config.save(dir)?;
    }
    let store_dir = StoreDirectory::new(dir, config);

    let store = TreeStore::new(store_dir.config().root_name.clone());
    store_dir.save(&store)?;
    println!("{} Initialized store in {}", "✓".green().bold(), dir.display().to_string().bold());
    println!("  Root: {}", store.root().name().blue().bold());
    println!("  Document: {}", store_dir.document_path().display().to_string().dimmed());
    Ok(())
}

/// A loaded store plus everything needed to save it back.
struct Session {
    dir: StoreDirectory,
    store: TreeStore,
    log: EventLog,
    sweeper: PayloadSweeper<PayloadDir>,
    format: OutputFormat,
}

impl Session {
    fn open(path: &Path, format: OutputFormat) -> anyhow::Result<Self> {
        let dir = StoreDirectory::open(path)?;
        if !dir.exists() {
            bail!("no store in {}; run `reel init` first", path.display());
        }
        let (mut store, report) = dir
            .load()
            .with_context(|| format!("loading {}", dir.document_path().display()))?;
        if !report.is_clean() {
            eprintln!(
                "{} skipped {} malformed record(s) in {}",
                "!".yellow().bold(),
                report.skipped,
                dir.document_path().display()
            );
        }

        let log = EventLog::new();
        store.subscribe(log.clone());
        let sweeper = PayloadSweeper::new(dir.payloads());
        Ok(Self { dir, store, log, sweeper, format })
    }

    /// Resolve `root`, a full UUID, or a unique UUID prefix.
    fn resolve(&self, reference: &str) -> anyhow::Result<ItemId> {
        let reference = reference.trim();
        if reference == "/" || reference.eq_ignore_ascii_case("root") {
            return Ok(self.store.root_id());
        }
        if let Ok(id) = ItemId::parse(reference) {
            if self.store.contains(id) {
                return Ok(id);
            }
            bail!("no item {id}");
        }

        let prefix = reference.to_ascii_uppercase();
        let matches: Vec<ItemId> = self
            .store
            .walk()
            .map(|node| node.id())
            .filter(|id| id.to_canonical().starts_with(&prefix))
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => bail!("no item matches '{reference}'"),
            _ => bail!("'{reference}' is ambiguous ({} matches)", matches.len()),
        }
    }

    fn node(&self, id: ItemId) -> anyhow::Result<NodeRef<'_>> {
        self.store.get(id).ok_or_else(|| anyhow!("no item {id}"))
    }

    /// Save the document, then release payloads and report what changed.
    ///
    /// Payloads are only removed once the document no longer lists their
    /// recordings; a failed save leaves every file in place.
    fn commit(&self) -> anyhow::Result<()> {
        self.dir.save(&self.store)?;
        for event in self.log.drain() {
            self.sweeper.sweep(event.released());
            self.print_event(&event);
        }
        Ok(())
    }

    fn print_event(&self, event: &ChangeEvent) {
        if self.format == OutputFormat::Json {
            println!("{}", event_json(event));
            return;
        }
        let id = event.item.short_id().dimmed();
        match &event.kind {
            ChangeKind::Added { .. } => {
                println!("{} Added {} {}", "✓".green().bold(), event.name.bold(), id)
            }
            ChangeKind::Removed { released, .. } => {
                println!("{} Deleted {} {}", "✓".green().bold(), event.name.bold(), id);
                if !released.is_empty() {
                    println!("  Released {} recording(s)", released.len());
                }
            }
            ChangeKind::Renamed { old_name, .. } => println!(
                "{} Renamed {} → {} {}",
                "✓".green().bold(),
                old_name,
                event.name.bold(),
                id
            ),
            ChangeKind::Moved { .. } => println!(
                "{} Moved {} into {} {}",
                "✓".green().bold(),
                event.name.bold(),
                event.parent.short_id().yellow(),
                id
            ),
        }
    }

    fn cmd_tree(&self, args: TreeArgs) -> anyhow::Result<()> {
        let node = self.node(self.resolve(&args.item)?)?;
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&codec::encode(node))?);
            return Ok(());
        }
        let base = node.depth();
        for node in self.store.walk_from(node.id()) {
            let indent = "  ".repeat(node.depth() - base);
            let name = if node.is_folder() {
                format!("{}/", node.name()).blue().bold()
            } else {
                node.name().normal()
            };
            println!("{indent}{name}  {}", node.id().short_id().dimmed());
        }
        Ok(())
    }

    fn cmd_mkdir(&mut self, args: MkdirArgs) -> anyhow::Result<()> {
        let parent = self.resolve(&args.parent)?;
        self.store.add(parent, Item::folder(args.name))?;
        self.commit()
    }

    fn cmd_add(&mut self, args: AddArgs) -> anyhow::Result<()> {
        let parent = self.resolve(&args.parent)?;
        let id = self.store.add(parent, Item::recording(args.name))?;
        if let Some(source) = &args.file {
            self.dir
                .import_payload(id, source)
                .with_context(|| format!("importing {}", source.display()))?;
        }
        self.commit()
    }

    fn cmd_rename(&mut self, args: RenameArgs) -> anyhow::Result<()> {
        let id = self.resolve(&args.item)?;
        self.store.rename(id, args.name)?;
        self.commit()
    }

    fn cmd_mv(&mut self, args: MvArgs) -> anyhow::Result<()> {
        let id = self.resolve(&args.item)?;
        let folder = self.resolve(&args.folder)?;
        self.store.move_item(id, folder)?;
        self.commit()
    }

    fn cmd_rm(&mut self, args: RmArgs) -> anyhow::Result<()> {
        let id = self.resolve(&args.item)?;
        self.store.delete(id)?;
        self.commit()
    }

    fn cmd_path(&self, args: ItemArgs) -> anyhow::Result<()> {
        let id = self.resolve(&args.item)?;
        let path = self
            .store
            .identifier_path(id)
            .ok_or_else(|| anyhow!("no item {id}"))?;
        if self.format == OutputFormat::Json {
            let ids: Vec<String> = path.iter().map(ItemId::to_canonical).collect();
            println!("{}", serde_json::to_string_pretty(&ids)?);
            return Ok(());
        }
        for (depth, step) in path.iter().enumerate() {
            let name = self.node(*step)?.name();
            println!("{}{}  {}", "  ".repeat(depth), name.bold(), step.to_canonical().dimmed());
        }
        Ok(())
    }

    fn cmd_locate(&self, args: ItemArgs) -> anyhow::Result<()> {
        let id = self.resolve(&args.item)?;
        let location = self
            .store
            .payload_location(id, &self.dir)
            .ok_or_else(|| anyhow!("{} is a folder and has no audio", id.short_id()))?;
        if self.format == OutputFormat::Json {
            println!("{}", json!({ "uuid": id.to_canonical(), "location": location, "exists": location.exists() }));
        } else {
            println!("{}", location.display());
        }
        Ok(())
    }

    fn cmd_show(&self, args: ItemArgs) -> anyhow::Result<()> {
        let node = self.node(self.resolve(&args.item)?)?;
        let location: Option<PathBuf> = (!node.is_folder()).then(|| self.dir.location(node.id()));

        if self.format == OutputFormat::Json {
            let value = json!({
                "uuid": node.id().to_canonical(),
                "name": node.name(),
                "kind": node.kind().to_string(),
                "parent": node.parent_id().map(|p| p.to_canonical()),
                "index": node.index(),
                "depth": node.depth(),
                "children": node.is_folder().then(|| node.child_count()),
                "location": location,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
            return Ok(());
        }

        println!("{} {}", node.kind().to_string().cyan(), node.name().bold());
        println!("  UUID: {}", node.id().to_canonical().yellow());
        match node.parent() {
            Some(parent) => println!(
                "  Parent: {} {} (position {})",
                parent.name(),
                parent.id().short_id().dimmed(),
                node.index().unwrap_or_default()
            ),
            None => println!("  Parent: {}", "none (root)".dimmed()),
        }
        println!("  Depth: {}", node.depth());
        if node.is_folder() {
            println!("  Children: {}", node.child_count());
        }
        if let Some(location) = location {
            let state = if location.exists() { "present".green() } else { "missing".red() };
            println!("  Audio: {} ({})", location.display(), state);
        }
        Ok(())
    }
}

fn event_json(event: &ChangeEvent) -> serde_json::Value {
    let mut value = json!({
        "event": event.kind.label(),
        "uuid": event.item.to_canonical(),
        "parent": event.parent.to_canonical(),
        "name": event.name,
    });
    match &event.kind {
        ChangeKind::Added { index } => value["index"] = json!(index),
        ChangeKind::Removed { index, released } => {
            value["index"] = json!(index);
            value["released"] = json!(released.iter().map(ItemId::to_canonical).collect::<Vec<_>>());
        }
        ChangeKind::Renamed { old_name, old_index, new_index } => {
            value["oldName"] = json!(old_name);
            value["oldIndex"] = json!(old_index);
            value["index"] = json!(new_index);
        }
        ChangeKind::Moved { from, old_index, index } => {
            value["from"] = json!(from.to_canonical());
            value["oldIndex"] = json!(old_index);
            value["index"] = json!(index);
        }
    }
    value
}
