//! User-facing strings (fa-IR).

pub const WELCOME: &str = "سلام! 👋\nبه ربات ارتباطی خوش اومدی. یکی از بخش‌ها رو انتخاب کن:";
pub const MAIN_MENU: &str = "یکی از گزینه‌ها را انتخاب کنید:";
pub const GROUP_MENU: &str = "نوع درخواست خود را انتخاب کنید:";
pub const START_HINT: &str = "برای شروع از /menu استفاده کنید.";
pub const CANCELLED: &str = "لغو شد.";
pub const BLOCKED: &str = "شما مسدود شده‌اید.";
pub const ADMIN_ONLY: &str = "⛔ این دستور مخصوص ادمین‌هاست.";

// Buttons
pub const BTN_SECTION_GROUP: &str = "ارتباط با ادمین‌های گروه";
pub const BTN_SECTION_BOTS: &str = "ارتباط با ربات‌های من";
pub const BTN_SECTION_VSERV: &str = "خدمات مجازی";
pub const BTN_GROUP_ADMIN_CHAT: &str = "درخواست ادمین چت";
pub const BTN_GROUP_ADMIN_CALL: &str = "درخواست ادمین کال";
pub const BTN_BACK: &str = "⬅️ بازگشت";
pub const BTN_SEND_REQUEST: &str = "📨 ارسال درخواست";
pub const BTN_CANCEL: &str = "❌ انصراف";
pub const BTN_SEND_AGAIN: &str = "✉️ ارسال پیام مجدد";
pub const BTN_OPEN_PRIVATE: &str = "شروع گفتگو در پی‌وی";

// Request flow
pub const ASK_REQUEST: &str =
    "پیام خود را بنویسید (متن، فایل یا آلبوم). برای لغو: /cancel";
pub const REQUEST_SENT: &str = "✅ پیام شما برای مدیریت ارسال شد. منتظر پاسخ بمانید.";
pub const REQUEST_FAILED: &str = "❌ در حال حاضر امکان ارسال پیام به مدیریت وجود ندارد.";
pub const GROUP_OWNER_HINT: &str = "سلام! برای ارتباط مستقیم، لطفاً به پی‌وی ربات پیام بدید. 👇";
/// Substring ("owner") that triggers [`GROUP_OWNER_HINT`] in groups.
pub const GROUP_OWNER_TRIGGER: &str = "مالک";

// Admin flow
pub const ASK_BROADCAST_USERS: &str =
    "پیام/فایل/آلبوم مورد نظر برای ارسال همگانی به <b>کاربران</b> را بفرستید. لغو: /cancel";
pub const ASK_BROADCAST_GROUPS: &str =
    "پیام/فایل/آلبوم مورد نظر برای ارسال به <b>همه گروه‌ها</b> را بفرستید. لغو: /cancel";
pub const ADMIN_REPLY_PREFIX: &str = "پاسخ ادمین:";
pub const REPLY_SENT: &str = "✅ ارسال شد.";
pub const REPLY_FAILED: &str = "❌ ارسال نشد. شاید کاربر پیوی ربات را باز نکرده.";
pub const RULES_SAVED: &str = "✅ قوانین ذخیره شد.";
pub const RULES_NEED_TEXT: &str = "لطفاً متن قوانین را به صورت متنی بفرستید. لغو: /cancel";
pub const NO_GROUPS: &str = "هیچ گروه فعالی ثبت نشده است.";
pub const EMPTY_ALBUM: &str = "⚠️ آلبوم هیچ فایل قابل ارسالی نداشت.";
pub const STORE_ERROR: &str = "❌ خطا در دسترسی به پایگاه داده.";

pub const HELP: &str = "دستورات کاربری:\n\
/start /menu /help /cancel\n\n\
دستورات ادمین:\n\
/broadcast – پیام همگانی به کاربران (همۀ انواع فایل/آلبوم)\n\
/groupsend – پیام به تمام گروه‌ها (همۀ انواع فایل/آلبوم)\n\
/listgroups – لیست گروه‌های ثبت‌شده\n\
/stats – آمار دقیق\n\
/addadmin &lt;user_id&gt; – افزودن ادمین\n\
/deladmin &lt;user_id&gt; – حذف ادمین\n\
/block &lt;user_id&gt; – بلاک\n\
/unblock &lt;user_id&gt; – آنبلاک\n\
/setrules &lt;section&gt; &lt;kind&gt; – تغییر قوانین دلخواه\n\
/setchat – تغییر قوانین چت گروه\n\
/setcall – تغییر قوانین کال گروه\n\
/setvserv – ست‌کردن قوانین خدمات مجازی\n\
/reply &lt;user_id&gt; – پاسخ به کاربر";

pub fn usage(command: &str, args: &str) -> String {
    format!("فرمت: /{command} {args}")
}

pub fn broadcast_done(sent: usize, groups: bool, album: bool) -> String {
    let audience = if groups { "گروه" } else { "کاربر" };
    if album {
        format!("✅ آلبوم برای {sent} {audience} ارسال شد.")
    } else {
        format!("✅ ارسال شد برای {sent} {audience}.")
    }
}

pub fn stats(users: usize, active_groups: usize) -> String {
    format!("📊 کاربران: {users}\n👥 گروه‌های فعال: {active_groups}")
}

pub fn groups_header(limit: usize) -> String {
    format!("گروه‌های ثبت‌شده (تا {limit} مورد اخیر):")
}

pub fn ask_reply(target: i64) -> String {
    format!("متن پاسخ برای کاربر <code>{target}</code> را بفرستید. لغو: /cancel")
}

pub fn ask_rules(section: &str, kind: &str) -> String {
    format!("متن جدید قوانین برای {section} / {kind} را بفرستید. لغو: /cancel")
}

pub fn admin_added(id: i64) -> String {
    format!("✅ کاربر {id} به عنوان ادمین اضافه شد.")
}

pub fn admin_removed(id: i64) -> String {
    format!("✅ دسترسی ادمینی کاربر {id} حذف شد.")
}

pub fn user_blocked(id: i64) -> String {
    format!("🚫 کاربر {id} بلاک شد.")
}

pub fn user_unblocked(id: i64) -> String {
    format!("♻️ کاربر {id} آنبلاک شد.")
}
