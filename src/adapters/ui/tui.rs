//! Implements InputPort. Inquire-based interactive menu over the expense and milestone use cases.

use crate::domain::{
    DomainError, Expense, ExpenseCategory, Milestone, MilestoneStatus, Money, NewExpense,
    NewMilestone, Priority,
};
use crate::ports::InputPort;
use crate::usecases::{ExpenseService, MilestoneSequencer};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use inquire::error::InquireError;
use inquire::ui::{Color, RenderConfig, Styled};
use inquire::{Confirm, CustomType, Select, Text};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Applies the prompt theme globally.
pub fn apply_theme() {
    let mut config = RenderConfig::default_colored();
    config.prompt_prefix = Styled::new("▸").with_fg(Color::rgb(0xff, 0x7a, 0x00));
    config.highlighted_option_prefix = Styled::new("➤").with_fg(Color::rgb(0x1e, 0x90, 0xff));
    inquire::set_global_render_config(config);
}

fn input_err(e: InquireError) -> DomainError {
    DomainError::Input(e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuAction {
    AddExpense,
    PreviewCategory,
    ListExpenses,
    Recategorize,
    ApproveExpense,
    ClassifyUncategorized,
    ExportCsv,
    AddMilestone,
    Timeline,
    MoveMilestone,
    UpdateProgress,
    DeleteMilestone,
    Quit,
}

impl MenuAction {
    const ALL: [MenuAction; 13] = [
        MenuAction::AddExpense,
        MenuAction::PreviewCategory,
        MenuAction::ListExpenses,
        MenuAction::Recategorize,
        MenuAction::ApproveExpense,
        MenuAction::ClassifyUncategorized,
        MenuAction::ExportCsv,
        MenuAction::AddMilestone,
        MenuAction::Timeline,
        MenuAction::MoveMilestone,
        MenuAction::UpdateProgress,
        MenuAction::DeleteMilestone,
        MenuAction::Quit,
    ];
}

impl fmt::Display for MenuAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MenuAction::AddExpense => "Add expense",
            MenuAction::PreviewCategory => "Suggest a category for a description",
            MenuAction::ListExpenses => "List expenses & totals",
            MenuAction::Recategorize => "Change an expense category",
            MenuAction::ApproveExpense => "Approve an expense",
            MenuAction::ClassifyUncategorized => "Auto-categorize uncategorized expenses",
            MenuAction::ExportCsv => "Export expenses to CSV",
            MenuAction::AddMilestone => "Add milestone",
            MenuAction::Timeline => "Milestone timeline",
            MenuAction::MoveMilestone => "Move milestone",
            MenuAction::UpdateProgress => "Update milestone progress",
            MenuAction::DeleteMilestone => "Delete milestone",
            MenuAction::Quit => "Quit",
        })
    }
}

/// Select option wrapping an expense.
struct ExpenseOption(Expense);

impl fmt::Display for ExpenseOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let e = &self.0;
        write!(
            f,
            "#{} {} [{}] {}{}",
            e.id,
            e.description,
            e.category,
            e.total(),
            if e.approved { " ✔" } else { "" }
        )
    }
}

/// Select option wrapping a milestone.
struct MilestoneOption(Milestone);

impl fmt::Display for MilestoneOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.0.position + 1, self.0.title)
    }
}

/// TUI adapter. Inquire prompts.
pub struct TuiInputPort {
    project_id: i64,
    expenses: Arc<ExpenseService>,
    milestones: Arc<MilestoneSequencer>,
}

impl TuiInputPort {
    pub fn new(
        project_id: i64,
        expenses: Arc<ExpenseService>,
        milestones: Arc<MilestoneSequencer>,
    ) -> Self {
        Self {
            project_id,
            expenses,
            milestones,
        }
    }

    async fn dispatch(&self, action: MenuAction) -> Result<(), DomainError> {
        match action {
            MenuAction::AddExpense => self.add_expense().await,
            MenuAction::PreviewCategory => self.preview_category().await,
            MenuAction::ListExpenses => self.list_expenses().await,
            MenuAction::Recategorize => self.recategorize().await,
            MenuAction::ApproveExpense => self.approve_expense().await,
            MenuAction::ClassifyUncategorized => self.classify_uncategorized().await,
            MenuAction::ExportCsv => self.export_csv().await,
            MenuAction::AddMilestone => self.add_milestone().await,
            MenuAction::Timeline => self.timeline().await,
            MenuAction::MoveMilestone => self.move_milestone().await,
            MenuAction::UpdateProgress => self.update_progress().await,
            MenuAction::DeleteMilestone => self.delete_milestone().await,
            MenuAction::Quit => Ok(()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expenses
    // ─────────────────────────────────────────────────────────────────────────

    async fn add_expense(&self) -> Result<(), DomainError> {
        let description = Text::new("Description:").prompt().map_err(input_err)?;
        let vendor = optional_text("Vendor (optional):")?;
        let amount = prompt_money("Amount:")?;
        let tax = prompt_money_optional("Tax (optional):")?;
        let submitted_by = Text::new("Submitted by:").prompt().map_err(input_err)?;
        let expense_date = CustomType::<NaiveDate>::new("Expense date (YYYY-MM-DD):")
            .with_default(Utc::now().date_naive())
            .prompt()
            .map_err(input_err)?;
        let auto_classify = Confirm::new("Suggest a category automatically?")
            .with_default(true)
            .prompt()
            .map_err(input_err)?;

        let created = self
            .expenses
            .create(
                NewExpense {
                    project_id: self.project_id,
                    description,
                    vendor,
                    amount,
                    tax,
                    category: None,
                    submitted_by,
                    expense_date: Some(expense_date),
                },
                auto_classify,
            )
            .await?;

        let mut expense = created.expense;
        match created.suggestion {
            Some(s) if created.auto_applied => {
                println!(
                    "Filed under {} ({:.0}% confident): {}",
                    s.category,
                    s.confidence * 100.0,
                    s.reasoning
                );
            }
            Some(s) => {
                println!(
                    "Suggested {} ({:.0}% confident): {}",
                    s.category,
                    s.confidence * 100.0,
                    s.reasoning
                );
                let accept = Confirm::new(&format!("Use category '{}'?", s.category))
                    .with_default(true)
                    .prompt()
                    .map_err(input_err)?;
                if accept {
                    expense = self.expenses.set_category(expense.id, s.category).await?;
                }
            }
            None => {}
        }
        println!("Saved {}", ExpenseOption(expense));
        Ok(())
    }

    async fn preview_category(&self) -> Result<(), DomainError> {
        let description = Text::new("Description:").prompt().map_err(input_err)?;
        let vendor = optional_text("Vendor (optional):")?;
        let suggestion = self
            .expenses
            .classifier()
            .classify(&description, vendor.as_deref(), None)
            .await?;
        println!(
            "{} ({:.0}%{}): {}",
            suggestion.category,
            suggestion.confidence * 100.0,
            if suggestion.is_fallback() {
                ", keyword fallback"
            } else {
                ""
            },
            suggestion.reasoning
        );
        Ok(())
    }

    async fn list_expenses(&self) -> Result<(), DomainError> {
        let expenses = self.expenses.list(self.project_id).await?;
        if expenses.is_empty() {
            println!("No expenses yet.");
            return Ok(());
        }
        for e in expenses {
            println!("  {}", ExpenseOption(e));
        }
        println!("Totals by category:");
        for (category, total) in self.expenses.category_totals(self.project_id).await? {
            println!("  {:<15} {}", category.as_str(), total);
        }
        Ok(())
    }

    async fn pick_expense(
        &self,
        prompt: &str,
        filter: impl Fn(&Expense) -> bool,
    ) -> Result<Option<Expense>, DomainError> {
        let options: Vec<ExpenseOption> = self
            .expenses
            .list(self.project_id)
            .await?
            .into_iter()
            .filter(|e| filter(e))
            .map(ExpenseOption)
            .collect();
        if options.is_empty() {
            println!("Nothing to choose from.");
            return Ok(None);
        }
        let picked = Select::new(prompt, options).prompt().map_err(input_err)?;
        Ok(Some(picked.0))
    }

    async fn recategorize(&self) -> Result<(), DomainError> {
        let Some(expense) = self.pick_expense("Expense:", |_| true).await? else {
            return Ok(());
        };
        let suggestion = self.expenses.suggest_category(expense.id).await?;
        let mut categories = ExpenseCategory::ALL.to_vec();
        let start = categories
            .iter()
            .position(|c| *c == suggestion.category)
            .unwrap_or(0);
        categories.rotate_left(start);
        let category = Select::new(
            &format!(
                "Category (suggested: {}, {:.0}%):",
                suggestion.category,
                suggestion.confidence * 100.0
            ),
            categories,
        )
        .prompt()
        .map_err(input_err)?;
        let updated = self.expenses.set_category(expense.id, category).await?;
        println!("Updated {}", ExpenseOption(updated));
        Ok(())
    }

    async fn approve_expense(&self) -> Result<(), DomainError> {
        let Some(expense) = self
            .pick_expense("Expense to approve:", |e| !e.approved)
            .await?
        else {
            return Ok(());
        };
        let approver = Text::new("Approver:").prompt().map_err(input_err)?;
        let approved = self.expenses.approve(expense.id, &approver).await?;
        println!(
            "Approved #{} by {}",
            approved.id,
            approved.approved_by.unwrap_or_default()
        );
        Ok(())
    }

    async fn classify_uncategorized(&self) -> Result<(), DomainError> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.set_message("Categorizing expenses...");
        spinner.enable_steady_tick(Duration::from_millis(100));
        let report = self.expenses.classify_uncategorized(self.project_id).await;
        spinner.finish_and_clear();
        let report = report?;

        println!(
            "{} uncategorized, {} classified, {} applied automatically",
            report.considered,
            report.suggested,
            report.applied.len()
        );
        for (id, suggestion) in report.pending_review {
            let accept = Confirm::new(&format!(
                "#{}: use '{}' ({:.0}%)? {}",
                id,
                suggestion.category,
                suggestion.confidence * 100.0,
                suggestion.reasoning
            ))
            .with_default(false)
            .prompt()
            .map_err(input_err)?;
            if accept {
                self.expenses.set_category(id, suggestion.category).await?;
            }
        }
        Ok(())
    }

    async fn export_csv(&self) -> Result<(), DomainError> {
        let path = Text::new("Write CSV to:")
            .with_default(&format!("expenses_project_{}.csv", self.project_id))
            .prompt()
            .map_err(input_err)?;
        let csv = self.expenses.export_csv(self.project_id).await?;
        tokio::fs::write(&path, csv)
            .await
            .map_err(|e| DomainError::Export(format!("write {}: {}", path, e)))?;
        println!("Exported to {}", path);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Milestones
    // ─────────────────────────────────────────────────────────────────────────

    async fn add_milestone(&self) -> Result<(), DomainError> {
        let title = Text::new("Title:").prompt().map_err(input_err)?;
        let description = optional_text("Description (optional):")?;
        let today = Utc::now().date_naive();
        let starts = CustomType::<NaiveDate>::new("Start date (YYYY-MM-DD):")
            .with_default(today)
            .prompt()
            .map_err(input_err)?;
        let ends = CustomType::<NaiveDate>::new("End date (YYYY-MM-DD):")
            .with_default(starts)
            .prompt()
            .map_err(input_err)?;
        let priority = Select::new("Priority:", Priority::ALL.to_vec())
            .with_starting_cursor(1)
            .prompt()
            .map_err(input_err)?;

        let milestone = self
            .milestones
            .create(NewMilestone {
                project_id: self.project_id,
                title,
                description,
                starts_at: starts.and_time(NaiveTime::MIN).and_utc(),
                ends_at: ends
                    .and_hms_opt(23, 59, 59)
                    .unwrap_or_else(|| ends.and_time(NaiveTime::MIN))
                    .and_utc(),
                priority,
            })
            .await?;
        println!("Added {}", MilestoneOption(milestone));
        Ok(())
    }

    async fn timeline(&self) -> Result<(), DomainError> {
        let timeline = self.milestones.timeline(self.project_id, Utc::now()).await?;
        if timeline.is_empty() {
            println!("No milestones yet.");
        }
        for (m, status) in timeline {
            println!(
                "  {:>2}. {:<30} {:<11} {:>3}%  {} → {}  [{}]",
                m.position + 1,
                m.title,
                status.to_string(),
                m.progress,
                m.starts_at.format("%Y-%m-%d"),
                m.ends_at.format("%Y-%m-%d"),
                m.priority
            );
        }
        Ok(())
    }

    async fn pick_milestone(&self, prompt: &str) -> Result<Option<Milestone>, DomainError> {
        let options: Vec<MilestoneOption> = self
            .milestones
            .list(self.project_id)
            .await?
            .into_iter()
            .map(MilestoneOption)
            .collect();
        if options.is_empty() {
            println!("No milestones yet.");
            return Ok(None);
        }
        let picked = Select::new(prompt, options).prompt().map_err(input_err)?;
        Ok(Some(picked.0))
    }

    async fn move_milestone(&self) -> Result<(), DomainError> {
        let Some(milestone) = self.pick_milestone("Milestone to move:").await? else {
            return Ok(());
        };
        let slot = CustomType::<usize>::new("New slot (1 = first):")
            .with_default(milestone.position as usize + 1)
            .prompt()
            .map_err(input_err)?;
        let outcome = self
            .milestones
            .reorder(self.project_id, milestone.id, slot.saturating_sub(1))
            .await?;
        println!("{} position(s) updated", outcome.writes);
        for m in outcome.ordered {
            println!("  {}", MilestoneOption(m));
        }
        Ok(())
    }

    async fn update_progress(&self) -> Result<(), DomainError> {
        let Some(milestone) = self.pick_milestone("Milestone:").await? else {
            return Ok(());
        };
        let status = Select::new("Status:", MilestoneStatus::ALL.to_vec())
            .prompt()
            .map_err(input_err)?;
        let progress = if status == MilestoneStatus::Completed {
            None
        } else {
            Some(
                CustomType::<u8>::new("Progress (0-100):")
                    .with_default(milestone.progress)
                    .prompt()
                    .map_err(input_err)?,
            )
        };
        let updated = self
            .milestones
            .update_progress(milestone.id, Some(status), progress)
            .await?;
        println!("{} is {} at {}%", updated.title, updated.status, updated.progress);
        Ok(())
    }

    async fn delete_milestone(&self) -> Result<(), DomainError> {
        let Some(milestone) = self.pick_milestone("Milestone to delete:").await? else {
            return Ok(());
        };
        let confirmed = Confirm::new(&format!("Delete '{}'?", milestone.title))
            .with_default(false)
            .prompt()
            .map_err(input_err)?;
        if confirmed {
            self.milestones.delete(milestone.id).await?;
            println!("Deleted.");
        }
        Ok(())
    }
}

fn optional_text(prompt: &str) -> Result<Option<String>, DomainError> {
    let value = Text::new(prompt).prompt().map_err(input_err)?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn prompt_money(prompt: &str) -> Result<Money, DomainError> {
    let raw = Text::new(prompt).prompt().map_err(input_err)?;
    Money::parse(&raw).map_err(DomainError::Validation)
}

fn prompt_money_optional(prompt: &str) -> Result<Option<Money>, DomainError> {
    let raw = Text::new(prompt).prompt().map_err(input_err)?;
    if raw.trim().is_empty() {
        return Ok(None);
    }
    Money::parse(&raw).map(Some).map_err(DomainError::Validation)
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let action = match Select::new(
                &format!("Project #{}", self.project_id),
                MenuAction::ALL.to_vec(),
            )
            .prompt()
            {
                Ok(action) => action,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(input_err(e)),
            };
            if action == MenuAction::Quit {
                return Ok(());
            }

            match self.dispatch(action).await {
                Ok(()) => {}
                Err(DomainError::Input(msg)) => warn!(error = %msg, "prompt cancelled"),
                Err(e) if e.is_client_error() => println!("✘ {}", e),
                Err(e) => {
                    warn!(error = %e, action = %action, "action failed");
                    println!("✘ {}", e);
                }
            }
        }
    }
}
