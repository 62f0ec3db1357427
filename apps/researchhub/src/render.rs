//! Plain-text tables for the terminal.

use client_core::navigation::{pick_active_href, NavDescriptor};
use shared::{
    domain::AcademicYearId,
    protocol::{
        AcademicYear, Announcement, ApprovedTopic, ApprovedTopicDocument, Department, Page,
        TopicRegistration, User, YearSession,
    },
};
use status_gate::{
    badge, project_approved, Decision, ExecutionPermissions, ReviewPermissions,
};

pub fn page_footer<T>(page: &Page<T>, requested: u32) {
    println!(
        "-- page {} of {}, {} total",
        requested + 1,
        page.total_pages.max(1),
        page.total_elements
    );
}

pub fn academic_years(years: &[AcademicYear], selected: Option<AcademicYearId>) {
    if years.is_empty() {
        println!("no academic years");
        return;
    }
    for year in years {
        let marker = if Some(year.id) == selected { "*" } else { " " };
        println!(
            "{marker} {:>4}  {}  {:<8}  {}",
            year.id.0,
            year.year,
            badge::academic_year(year.status).label,
            badge::active(year.is_active).label,
        );
    }
}

pub fn year_sessions(sessions: &[YearSession]) {
    if sessions.is_empty() {
        println!("no year sessions");
        return;
    }
    for session in sessions {
        println!(
            "{:>4}  year {:<6}  {:<24}  {}",
            session.id.0,
            session
                .year
                .map(|year| year.to_string())
                .unwrap_or_else(|| session.academic_year_id.to_string()),
            session.department_name,
            badge::session(session.status).label,
        );
    }
}

pub fn topics(topics: &[TopicRegistration]) {
    if topics.is_empty() {
        println!("no topics");
        return;
    }
    for topic in topics {
        println!(
            "{:>5}  {:<16}  {:<18}  {}",
            topic.id.0,
            badge::topic(topic.status).label,
            topic
                .session_status
                .map(|status| badge::session(status).label)
                .unwrap_or("-"),
            topic.title,
        );
    }
}

pub fn topic_detail(topic: &TopicRegistration, permissions: &ReviewPermissions) {
    println!("#{} {}", topic.id, topic.title);
    println!("  status     {}", badge::topic(topic.status).label);
    if let Some(session) = topic.session_status {
        println!("  session    {}", badge::session(session).label);
    }
    if let Some(leader) = &topic.student_leader_name {
        println!("  leader     {leader}");
    }
    if let Some(advisor) = &topic.advisor_name {
        println!("  advisor    {advisor}");
    }
    if let Some(projection) = project_approved(topic) {
        let status = topic.approved_status.unwrap_or(projection.status);
        println!("  execution  {}", badge::approved_topic(status).label);
    }
    println!("  submitted  {}", topic.submitted_at);
    for member in &topic.pending_members {
        println!("  pending    {} ({})", member.name, member.id);
    }
    for member in &topic.approved_members {
        println!("  member     {} ({})", member.name, member.id);
    }
    decision("approve", permissions.approve);
    decision("reject", permissions.reject);
    decision("request-update", permissions.request_update);
    decision("members", permissions.member_approval);
}

pub fn approved_topics(topics: &[ApprovedTopic]) {
    if topics.is_empty() {
        println!("no approved topics");
        return;
    }
    for topic in topics {
        println!(
            "{:>5}  {:<14}  {:<14}  {}",
            topic.id.0,
            if topic.code.is_empty() { "-" } else { &topic.code },
            badge::approved_topic(topic.status).label,
            topic.topic.title,
        );
    }
}

pub fn approved_detail(topic: &ApprovedTopic, permissions: &ExecutionPermissions) {
    println!("#{} {}", topic.id, topic.topic.title);
    println!(
        "  code       {}",
        if topic.code.is_empty() { "-" } else { &topic.code }
    );
    println!("  status     {}", badge::approved_topic(topic.status).label);
    println!("  registration #{}", topic.topic.id);
    if let Some(prize) = &topic.prize {
        println!("  prize      {prize}");
    }
    if permissions.all_denied() {
        println!("  no further actions");
        return;
    }
    decision("complete", permissions.complete);
    decision("not-completed", permissions.mark_not_completed);
    decision("cancel", permissions.cancel);
    decision("upload", permissions.upload);
}

pub fn documents(documents: &[ApprovedTopicDocument]) {
    if documents.is_empty() {
        println!("no documents");
        return;
    }
    for document in documents {
        println!(
            "{:>5}  {:<24}  {}  {}",
            document.id.0,
            document.document_type.as_str(),
            document.uploaded_at,
            document.file_url
        );
        if let Some(summary) = &document.scientific_article_summary {
            println!("       {summary}");
        }
    }
}

pub fn announcements(announcements: &[Announcement]) {
    if announcements.is_empty() {
        println!("no announcements");
        return;
    }
    for announcement in announcements {
        println!(
            "{:>5}  {}  {:<16}  {}",
            announcement.id.0,
            announcement.publish_datetime,
            announcement.department_name.as_deref().unwrap_or("all"),
            announcement.title,
        );
    }
}

pub fn users(users: &[User]) {
    if users.is_empty() {
        println!("no users");
        return;
    }
    for user in users {
        println!(
            "{:>5}  {:<16}  {:<10}  {}",
            user.id.0,
            user.username,
            user.role.as_str(),
            user.full_name
        );
    }
}

pub fn profile(user: &User) {
    println!("{} ({})", user.full_name, user.role.as_str());
    println!("username    {}", user.username);
    if let Some(department) = &user.department_name {
        println!("department  {department}");
    }
    if let Some(email) = &user.email {
        println!("email       {email}");
    }
    if let Some(phone) = &user.phone_number {
        println!("phone       {phone}");
    }
}

pub fn departments(departments: &[Department]) {
    if departments.is_empty() {
        println!("no departments");
        return;
    }
    for department in departments {
        let members = department
            .user_count
            .map(|count| format!("{count} users"))
            .unwrap_or_default();
        println!(
            "{:>5}  {:<10}  {:<32}  {}",
            department.id.0, department.code, department.name, members
        );
    }
}

pub fn navigation(nav: &NavDescriptor, path: &str) {
    let active = pick_active_href(nav.items, path);
    for item in nav.items {
        let marker = if Some(item.href) == active { ">" } else { " " };
        println!("{marker} {:<18} {}", item.label, item.href);
    }
}

fn decision(action: &str, decision: Decision) {
    match decision {
        Decision::Allowed => println!("  [x] {action}"),
        Decision::Denied(reason) => println!("  [ ] {action}: {reason}"),
    }
}
